use gtk4::prelude::*;
use gtk4::{
    ApplicationWindow, Box, Button, ButtonsType, FileChooserAction, FileChooserNative, FileFilter,
    Grid, Label, ListBox, MessageDialog, MessageType, Orientation, Paned, PolicyType,
    PopoverMenuBar, ResponseType, ScrolledWindow, SelectionMode, Separator,
};
use relm4::component::{ComponentController, Controller};
use relm4::{Component, ComponentParts, ComponentSender, RelmWidgetExt, SimpleComponent};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::bottle::human_size;
use crate::core::bottle_manager::{BottleManager, NewBottleParams, Tool};
use crate::core::config::{self, AppConfig};
use crate::core::winetricks::Package;
use crate::ui::about_dialog;
use crate::ui::busy_dialog::BusyDialog;
use crate::ui::edit_window::{EditWindow, EditWindowMsg, EditWindowOutput};
use crate::ui::menu::{MenuBar, MenuEvent};
use crate::ui::new_bottle_dialog::{NewBottleDialog, NewBottleDialogMsg, NewBottleDialogOutput};
use crate::ui::preferences_window::{
    PreferencesWindow, PreferencesWindowMsg, PreferencesWindowOutput,
};
use crate::ui::settings_window::{SettingsWindow, SettingsWindowMsg, SettingsWindowOutput};

const FEEDBACK_URI: &str = "mailto:feedback@cellar-app.dev";

#[derive(Debug)]
pub enum MainWindowMsg {
    Menu(MenuEvent),
    RefreshBottles,
    RowSelected(i32),
    ShowNewBottleDialog,
    CreateBottle(NewBottleParams),
    BottleCreated { error: Option<String> },
    ShowEditWindow,
    ShowSettingsWindow,
    EditOutput(EditWindowOutput),
    SettingsOutput(SettingsWindowOutput),
    RunProgram,
    ProgramChosen(PathBuf),
    ExecFailed,
    OpenDriveC,
    Reboot,
    UpdateBottleConfig,
    KillProcesses,
    DeleteBottle,
    DeleteConfirmed,
    InstallPackage(Package),
    InstallPackageConfirmed(Package),
    PackageInstallFinished { error: Option<String> },
    ExportBottle,
    ExportTargetChosen(PathBuf),
    ImportBottle,
    ImportArchiveChosen(PathBuf),
    ShowPreferences,
    PreferencesSaved(AppConfig),
    ShowAbout,
    GiveFeedback,
    Quit,
}

/// Root window and coordinator: owns the domain services and subscribes to
/// every child component's output events.
pub struct MainWindow {
    manager: BottleManager,
    bottle_list: ListBox,
    detail_name: Label,
    detail_windows: Label,
    detail_wine_version: Label,
    detail_location: Label,
    detail_c_drive: Label,
    detail_last_updated: Label,
    detail_disk_usage: Label,
    detail_audio: Label,
    detail_virtual_desktop: Label,
    busy_dialog: BusyDialog,
    edit_window: Controller<EditWindow>,
    settings_window: Controller<SettingsWindow>,
    new_bottle_dialog: Controller<NewBottleDialog>,
    preferences_window: Controller<PreferencesWindow>,
    file_dialog: Option<FileChooserNative>,
    root_window: ApplicationWindow,
}

impl MainWindow {
    fn show_error(&self, message: &str) {
        let dialog = MessageDialog::builder()
            .transient_for(&self.root_window)
            .modal(true)
            .message_type(MessageType::Error)
            .buttons(ButtonsType::Ok)
            .text(message)
            .title("An error has occurred!")
            .build();
        dialog.connect_response(|dialog, _| dialog.destroy());
        dialog.present();
    }

    fn show_confirm(&self, message: &str, on_yes: impl Fn() + 'static) {
        let dialog = MessageDialog::builder()
            .transient_for(&self.root_window)
            .modal(true)
            .message_type(MessageType::Question)
            .buttons(ButtonsType::YesNo)
            .text(message)
            .title("Are you sure?")
            .build();
        dialog.connect_response(move |dialog, response| {
            if response == ResponseType::Yes {
                on_yes();
            }
            dialog.destroy();
        });
        dialog.present();
    }

    fn rebuild_bottle_list(&self) {
        let list = &self.bottle_list;
        while let Some(child) = list.first_child() {
            list.remove(&child);
        }

        if self.manager.bottles().is_empty() {
            let empty = Box::new(Orientation::Vertical, 4);
            empty.set_margin_all(12);

            let title = Label::new(Some("No machines yet"));
            title.set_css_classes(&["card-title"]);
            title.set_halign(gtk4::Align::Start);

            let subtitle = Label::new(Some("Create a new machine to get started."));
            subtitle.set_css_classes(&["muted"]);
            subtitle.set_halign(gtk4::Align::Start);
            subtitle.set_wrap(true);

            empty.append(&title);
            empty.append(&subtitle);
            list.append(&empty);
            return;
        }

        for bottle in self.manager.bottles() {
            let row = Box::new(Orientation::Vertical, 4);
            row.set_margin_all(8);

            let name = Label::new(None);
            name.set_markup(&format!(
                "<span size=\"medium\"><b>{}</b></span>",
                glib::markup_escape_text(&bottle.name)
            ));
            name.set_halign(gtk4::Align::Start);

            let windows = Label::new(Some(&format!("{} ({})", bottle.windows, bottle.bit)));
            windows.set_css_classes(&["muted"]);
            windows.set_halign(gtk4::Align::Start);

            let (status_text, status_class) = if bottle.status_ok {
                ("Ready", "pill-installed")
            } else {
                ("Not Ready", "pill-missing")
            };
            let status = Label::new(Some(status_text));
            status.set_css_classes(&["pill", status_class]);
            status.set_halign(gtk4::Align::Start);

            row.append(&name);
            row.append(&windows);
            row.append(&status);
            list.append(&row);
        }
    }

    fn update_details(&self) {
        match self.manager.active() {
            Some(bottle) => {
                self.detail_name.set_text(&bottle.name);
                self.detail_windows
                    .set_text(&format!("{} ({})", bottle.windows, bottle.bit));
                self.detail_wine_version
                    .set_text(&format!("v{}", bottle.wine_version));
                self.detail_location
                    .set_text(&bottle.prefix.to_string_lossy());
                self.detail_c_drive
                    .set_text(&bottle.c_drive.to_string_lossy());
                self.detail_last_updated
                    .set_text(bottle.last_updated.as_deref().unwrap_or("- Unknown -"));
                self.detail_disk_usage
                    .set_text(&human_size(bottle.disk_usage));
                self.detail_audio.set_text(&bottle.audio_driver.to_string());
                self.detail_virtual_desktop
                    .set_text(bottle.virtual_desktop.as_deref().unwrap_or("Disabled"));
            }
            None => {
                self.detail_name.set_text("-");
                self.detail_windows.set_text("");
                self.detail_wine_version.set_text("v?");
                self.detail_location.set_text("");
                self.detail_c_drive.set_text("");
                self.detail_last_updated.set_text("");
                self.detail_disk_usage.set_text("");
                self.detail_audio.set_text("");
                self.detail_virtual_desktop.set_text("");
            }
        }
    }

    /// Hand the new active bottle (or its absence) to the bound windows
    fn broadcast_active(&self) {
        match self.manager.active() {
            Some(bottle) => {
                self.edit_window
                    .emit(EditWindowMsg::SetActiveBottle(bottle.clone()));
                self.settings_window
                    .emit(SettingsWindowMsg::SetActiveBottle(bottle.clone()));
                self.settings_window
                    .emit(SettingsWindowMsg::UpdateInstalled(
                        self.manager.installed_packages(),
                    ));
            }
            None => {
                self.edit_window.emit(EditWindowMsg::ResetActiveBottle);
                self.settings_window
                    .emit(SettingsWindowMsg::ResetActiveBottle);
            }
        }
    }

    fn select_active_row(&self) {
        if self.manager.active().is_some() {
            self.bottle_list
                .select_row(self.bottle_list.row_at_index(0).as_ref());
        }
    }

    /// Native dialogs are not owned by the widget tree; the previous one is
    /// dropped here so only the newest chooser stays alive.
    fn drop_stale_chooser(&mut self) {
        if let Some(dialog) = self.file_dialog.take() {
            dialog.destroy();
        }
    }

    fn choose_program(&mut self, sender: &ComponentSender<Self>) {
        self.drop_stale_chooser();
        let dialog = FileChooserNative::builder()
            .title("Please choose a file")
            .action(FileChooserAction::Open)
            .accept_label("_Open")
            .cancel_label("_Cancel")
            .transient_for(&self.root_window)
            .build();

        let filter_win = FileFilter::new();
        filter_win.add_suffix("exe");
        filter_win.add_suffix("msi");
        filter_win.set_name(Some("Windows Executable/MSI Installer"));
        dialog.add_filter(&filter_win);

        let filter_any = FileFilter::new();
        filter_any.add_pattern("*");
        filter_any.set_name(Some("Any file"));
        dialog.add_filter(&filter_any);

        let sender = sender.clone();
        dialog.connect_response(move |dialog, response| {
            if response == ResponseType::Accept {
                if let Some(path) = dialog.file().and_then(|file| file.path()) {
                    sender.input(MainWindowMsg::ProgramChosen(path));
                }
            }
            dialog.destroy();
        });

        dialog.show();
        self.file_dialog = Some(dialog);
    }

    fn choose_export_target(&mut self, sender: &ComponentSender<Self>, default_name: &str) {
        self.drop_stale_chooser();
        let dialog = FileChooserNative::builder()
            .title("Export Machine")
            .action(FileChooserAction::Save)
            .accept_label("_Export")
            .cancel_label("_Cancel")
            .transient_for(&self.root_window)
            .build();
        dialog.set_current_name(default_name);

        let sender = sender.clone();
        dialog.connect_response(move |dialog, response| {
            if response == ResponseType::Accept {
                if let Some(path) = dialog.file().and_then(|file| file.path()) {
                    sender.input(MainWindowMsg::ExportTargetChosen(path));
                }
            }
            dialog.destroy();
        });

        dialog.show();
        self.file_dialog = Some(dialog);
    }

    fn choose_import_archive(&mut self, sender: &ComponentSender<Self>) {
        self.drop_stale_chooser();
        let dialog = FileChooserNative::builder()
            .title("Import Machine")
            .action(FileChooserAction::Open)
            .accept_label("_Import")
            .cancel_label("_Cancel")
            .transient_for(&self.root_window)
            .build();

        let filter = FileFilter::new();
        filter.add_pattern("*.tar.gz");
        filter.set_name(Some("Machine archives (.tar.gz)"));
        dialog.add_filter(&filter);

        let sender = sender.clone();
        dialog.connect_response(move |dialog, response| {
            if response == ResponseType::Accept {
                if let Some(path) = dialog.file().and_then(|file| file.path()) {
                    sender.input(MainWindowMsg::ImportArchiveChosen(path));
                }
            }
            dialog.destroy();
        });

        dialog.show();
        self.file_dialog = Some(dialog);
    }

    fn give_feedback(&self) {
        let opened = Command::new("xdg-open")
            .arg(FEEDBACK_URI)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .is_ok();
        if !opened {
            self.show_error("Could not open e-mail program.");
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for MainWindow {
    type Init = ();
    type Input = MainWindowMsg;
    type Output = ();

    view! {
        #[root]
        ApplicationWindow {
            set_title: Some("Cellar - WINE Manager"),
            set_default_width: 1000,
            set_default_height: 600,

            #[wrap(Some)]
            set_child = &Box {
                set_orientation: Orientation::Vertical,
                set_spacing: 0,

                #[local_ref]
                menu_widget -> PopoverMenuBar {},

                append = &Paned {
                    set_orientation: Orientation::Horizontal,
                    set_vexpand: true,
                    set_shrink_start_child: false,

                    #[wrap(Some)]
                    set_start_child = &ScrolledWindow {
                        set_policy: (PolicyType::Never, PolicyType::Automatic),
                        set_min_content_width: 240,

                        #[local_ref]
                        bottle_list -> ListBox {},
                    },

                    #[wrap(Some)]
                    set_end_child = &Box {
                        set_orientation: Orientation::Vertical,
                        set_spacing: 8,

                        // Toolbar
                        append = &Box {
                            set_orientation: Orientation::Horizontal,
                            set_spacing: 6,
                            set_margin_all: 8,

                            append = &Button {
                                set_label: "New",
                                set_tooltip_text: Some("Create a new machine!"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::ShowNewBottleDialog,
                            },

                            append = &Button {
                                set_label: "Run Program...",
                                set_tooltip_text: Some("Run exe or msi in Wine Machine"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::RunProgram,
                            },

                            append = &Button {
                                set_label: "Open C: Drive",
                                set_tooltip_text: Some("Open the C: drive location in file manager"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::OpenDriveC,
                            },

                            append = &Button {
                                set_label: "Edit",
                                set_tooltip_text: Some("Edit Wine Machine"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::ShowEditWindow,
                            },

                            append = &Button {
                                set_label: "Settings",
                                set_tooltip_text: Some("Install additional packages"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::ShowSettingsWindow,
                            },

                            append = &Button {
                                set_label: "Reboot",
                                set_tooltip_text: Some("Simulate Machine Reboot"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::Reboot,
                            },

                            append = &Button {
                                set_label: "Update Config",
                                set_tooltip_text: Some("Update the Wine Machine configuration"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::UpdateBottleConfig,
                            },

                            append = &Button {
                                set_label: "Kill processes",
                                set_tooltip_text: Some("Kill all running processes in Wine Machine"),
                                set_css_classes: &["toolbar-button"],
                                connect_clicked => MainWindowMsg::KillProcesses,
                            },
                        },

                        append = &Separator {
                            set_orientation: Orientation::Horizontal,
                        },

                        #[local_ref]
                        detail_grid -> Grid {},
                    },
                },

                // Status bar
                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 12,
                    set_margin_all: 8,
                    set_css_classes: &["status-bar"],

                    append = &Label {
                        #[watch]
                        set_label: &format!("{} machines", model.manager.bottles().len()),
                        set_css_classes: &["muted"],
                    },

                    append = &Box {
                        set_hexpand: true,
                    },

                    append = &Label {
                        #[watch]
                        set_label: &model
                            .manager
                            .active()
                            .map(|bottle| bottle.name.clone())
                            .unwrap_or_else(|| "No machine selected".to_string()),
                        set_css_classes: &["muted"],
                        set_halign: gtk4::Align::End,
                    },
                },
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let mut manager = BottleManager::new(config::data_dir());
        let prepare_error = manager.prepare().err();

        let menu_sender = sender.clone();
        let menu_bar = MenuBar::new(&root, move |event| {
            menu_sender.input(MainWindowMsg::Menu(event));
        });
        let menu_widget = menu_bar.widget().clone();

        let bottle_list = ListBox::new();
        bottle_list.set_selection_mode(SelectionMode::Single);
        let list_sender = sender.clone();
        bottle_list.connect_row_selected(move |_, row| {
            if let Some(row) = row {
                list_sender.input(MainWindowMsg::RowSelected(row.index()));
            }
        });

        // Detail panel labels, filled by update_details()
        let detail_name = Label::new(None);
        let detail_windows = Label::new(None);
        let detail_wine_version = Label::new(None);
        let detail_location = Label::new(None);
        let detail_c_drive = Label::new(None);
        let detail_last_updated = Label::new(None);
        let detail_disk_usage = Label::new(None);
        let detail_audio = Label::new(None);
        let detail_virtual_desktop = Label::new(None);

        let detail_grid = Grid::new();
        detail_grid.set_margin_all(8);
        detail_grid.set_column_spacing(8);
        detail_grid.set_row_spacing(12);

        let general_heading = Label::new(None);
        general_heading.set_markup("<b>General</b>");
        general_heading.set_halign(gtk4::Align::Start);
        detail_grid.attach(&general_heading, 0, 0, 2, 1);

        let rows: [(&str, &Label); 7] = [
            ("Name:", &detail_name),
            ("Windows:", &detail_windows),
            ("Wine Version:", &detail_wine_version),
            ("Wine Location:", &detail_location),
            ("C:\\ Drive Location:", &detail_c_drive),
            ("Wine Last Changed:", &detail_last_updated),
            ("Disk Usage:", &detail_disk_usage),
        ];
        for (index, (text, value)) in rows.iter().enumerate() {
            let label = Label::new(Some(text));
            label.set_halign(gtk4::Align::Start);
            value.set_halign(gtk4::Align::Start);
            value.set_selectable(true);
            detail_grid.attach(&label, 0, index as i32 + 1, 1, 1);
            detail_grid.attach(*value, 1, index as i32 + 1, 1, 1);
        }

        let audio_heading = Label::new(None);
        audio_heading.set_markup("<b>Audio</b>");
        audio_heading.set_halign(gtk4::Align::Start);
        detail_grid.attach(&audio_heading, 0, 8, 2, 1);

        let audio_label = Label::new(Some("Audio Driver:"));
        audio_label.set_halign(gtk4::Align::Start);
        detail_audio.set_halign(gtk4::Align::Start);
        detail_grid.attach(&audio_label, 0, 9, 1, 1);
        detail_grid.attach(&detail_audio, 1, 9, 1, 1);

        let display_heading = Label::new(None);
        display_heading.set_markup("<b>Display</b>");
        display_heading.set_halign(gtk4::Align::Start);
        detail_grid.attach(&display_heading, 0, 10, 2, 1);

        let desktop_label = Label::new(Some("Virtual Desktop\n(Window Mode):"));
        desktop_label.set_halign(gtk4::Align::Start);
        detail_virtual_desktop.set_halign(gtk4::Align::Start);
        detail_grid.attach(&desktop_label, 0, 11, 1, 1);
        detail_grid.attach(&detail_virtual_desktop, 1, 11, 1, 1);

        let busy_dialog = BusyDialog::new(&root);

        let edit_window = EditWindow::builder()
            .launch(())
            .forward(sender.input_sender(), MainWindowMsg::EditOutput);
        let settings_window = SettingsWindow::builder()
            .launch(())
            .forward(sender.input_sender(), MainWindowMsg::SettingsOutput);
        let new_bottle_dialog = NewBottleDialog::builder().launch(()).forward(
            sender.input_sender(),
            |NewBottleDialogOutput::Create(params)| MainWindowMsg::CreateBottle(params),
        );
        let preferences_window = PreferencesWindow::builder().launch(()).forward(
            sender.input_sender(),
            |PreferencesWindowOutput::Saved(config)| MainWindowMsg::PreferencesSaved(config),
        );

        let model = MainWindow {
            manager,
            bottle_list: bottle_list.clone(),
            detail_name,
            detail_windows,
            detail_wine_version,
            detail_location,
            detail_c_drive,
            detail_last_updated,
            detail_disk_usage,
            detail_audio,
            detail_virtual_desktop,
            busy_dialog,
            edit_window,
            settings_window,
            new_bottle_dialog,
            preferences_window,
            file_dialog: None,
            root_window: root.clone(),
        };

        let widgets = view_output!();

        if let Some(err) = prepare_error {
            model.show_error(&format!("{:#}", err));
        }
        model.rebuild_bottle_list();
        model.update_details();
        model.broadcast_active();
        model.select_active_row();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            MainWindowMsg::Menu(event) => {
                let forwarded = match event {
                    MenuEvent::Preferences => MainWindowMsg::ShowPreferences,
                    MenuEvent::Quit => MainWindowMsg::Quit,
                    MenuEvent::RefreshList => MainWindowMsg::RefreshBottles,
                    MenuEvent::NewMachine => MainWindowMsg::ShowNewBottleDialog,
                    MenuEvent::EditMachine => MainWindowMsg::ShowEditWindow,
                    MenuEvent::SettingsMachine => MainWindowMsg::ShowSettingsWindow,
                    MenuEvent::RemoveMachine => MainWindowMsg::DeleteBottle,
                    MenuEvent::RunProgram => MainWindowMsg::RunProgram,
                    MenuEvent::OpenCDrive => MainWindowMsg::OpenDriveC,
                    MenuEvent::ExportMachine => MainWindowMsg::ExportBottle,
                    MenuEvent::ImportMachine => MainWindowMsg::ImportBottle,
                    MenuEvent::GiveFeedback => MainWindowMsg::GiveFeedback,
                    MenuEvent::About => MainWindowMsg::ShowAbout,
                };
                sender.input(forwarded);
            }
            MainWindowMsg::RefreshBottles => {
                if let Err(err) = self.manager.update_bottles() {
                    self.show_error(&format!("{:#}", err));
                }
                self.rebuild_bottle_list();
                self.update_details();
                self.broadcast_active();
                self.select_active_row();
            }
            MainWindowMsg::RowSelected(index) => {
                let bottle = usize::try_from(index)
                    .ok()
                    .and_then(|index| self.manager.bottles().get(index).cloned());
                if let Some(bottle) = bottle {
                    self.manager.set_active(bottle);
                    self.update_details();
                    self.broadcast_active();
                }
            }
            MainWindowMsg::ShowNewBottleDialog => {
                self.new_bottle_dialog.emit(NewBottleDialogMsg::Show);
            }
            MainWindowMsg::CreateBottle(params) => {
                let done_sender = sender.clone();
                let result = self.manager.new_bottle(params, move |result| {
                    done_sender.input(MainWindowMsg::BottleCreated {
                        error: result.err().map(|err| format!("{:#}", err)),
                    });
                });
                if let Err(err) = result {
                    self.new_bottle_dialog
                        .emit(NewBottleDialogMsg::CreationFinished { ok: false });
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::BottleCreated { error } => {
                self.manager.creation_finished();
                let ok = error.is_none();
                if let Some(message) = error {
                    self.show_error(&message);
                }
                self.new_bottle_dialog
                    .emit(NewBottleDialogMsg::CreationFinished { ok });
                sender.input(MainWindowMsg::RefreshBottles);
            }
            MainWindowMsg::ShowEditWindow => {
                self.edit_window.emit(EditWindowMsg::Show);
            }
            MainWindowMsg::ShowSettingsWindow => {
                self.settings_window
                    .emit(SettingsWindowMsg::UpdateInstalled(
                        self.manager.installed_packages(),
                    ));
                self.settings_window.emit(SettingsWindowMsg::Show);
            }
            MainWindowMsg::EditOutput(output) => match output {
                EditWindowOutput::Rename(name) => {
                    if let Err(err) = self.manager.rename_active(&name) {
                        self.show_error(&format!("{:#}", err));
                    } else {
                        sender.input(MainWindowMsg::RefreshBottles);
                    }
                }
                EditWindowOutput::DeleteRequested => {
                    sender.input(MainWindowMsg::DeleteBottle);
                }
                EditWindowOutput::OpenWinecfg => {
                    if let Err(err) = self.manager.open_tool(Tool::Winecfg) {
                        self.show_error(&format!("{:#}", err));
                    }
                }
            },
            MainWindowMsg::SettingsOutput(output) => match output {
                SettingsWindowOutput::Install(package) => {
                    sender.input(MainWindowMsg::InstallPackage(package));
                }
                SettingsWindowOutput::OpenTool(tool) => {
                    if let Err(err) = self.manager.open_tool(tool) {
                        self.show_error(&format!("{:#}", err));
                    }
                }
            },
            MainWindowMsg::RunProgram => {
                self.choose_program(&sender);
            }
            MainWindowMsg::ProgramChosen(path) => {
                let exit_sender = sender.clone();
                let result = self.manager.run_program(&path, move |success| {
                    if !success {
                        exit_sender.input(MainWindowMsg::ExecFailed);
                    }
                });
                if let Err(err) = result {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::ExecFailed => {
                self.show_error("Executing the selected Windows application on Wine went wrong.");
            }
            MainWindowMsg::OpenDriveC => {
                if let Err(err) = self.manager.open_c_drive() {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::Reboot => {
                if let Err(err) = self.manager.reboot() {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::UpdateBottleConfig => {
                if let Err(err) = self.manager.update_config_in_bottle() {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::KillProcesses => {
                if let Err(err) = self.manager.kill_processes() {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::DeleteBottle => match self.manager.active() {
                Some(bottle) => {
                    let message = format!(
                        "Are you sure you want to *permanently* remove machine named '{}' running {}?\n\n\
                         Note: This action cannot be undone!",
                        bottle.name, bottle.windows
                    );
                    let confirm_sender = sender.clone();
                    self.show_confirm(&message, move || {
                        confirm_sender.input(MainWindowMsg::DeleteConfirmed);
                    });
                }
                None => {
                    self.show_error("No Windows Machine to remove, empty/no selection.");
                }
            },
            MainWindowMsg::DeleteConfirmed => {
                if let Err(err) = self.manager.delete_active() {
                    self.show_error(&format!("{:#}", err));
                }
                sender.input(MainWindowMsg::RefreshBottles);
            }
            MainWindowMsg::InstallPackage(package) => {
                if matches!(package, Package::DotNet { .. }) {
                    let confirm_sender = sender.clone();
                    self.show_confirm(
                        "Important note: Wine Mono & Gecko support is often sufficient enough.\n\n\
                         Wine Mono will be *uninstalled* before native .NET will be installed.\n\n\
                         Are you sure you want to continue?",
                        move || {
                            confirm_sender
                                .input(MainWindowMsg::InstallPackageConfirmed(package.clone()));
                        },
                    );
                } else {
                    sender.input(MainWindowMsg::InstallPackageConfirmed(package));
                }
            }
            MainWindowMsg::InstallPackageConfirmed(package) => {
                self.busy_dialog.show(&package.busy_message());
                let done_sender = sender.clone();
                let result = self.manager.install_package(package, move |result| {
                    done_sender.input(MainWindowMsg::PackageInstallFinished {
                        error: result.err().map(|err| format!("{:#}", err)),
                    });
                });
                if let Err(err) = result {
                    self.busy_dialog.close();
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::PackageInstallFinished { error } => {
                self.busy_dialog.close();
                if let Some(message) = error {
                    self.show_error(&message);
                }
                self.settings_window
                    .emit(SettingsWindowMsg::UpdateInstalled(
                        self.manager.installed_packages(),
                    ));
            }
            MainWindowMsg::ExportBottle => match self.manager.active() {
                Some(bottle) => {
                    let default_name = format!("{}.tar.gz", bottle.name.replace('/', "_"));
                    self.choose_export_target(&sender, &default_name);
                }
                None => {
                    self.show_error("No Windows Machine to export, empty/no selection.");
                }
            },
            MainWindowMsg::ExportTargetChosen(path) => {
                if let Err(err) = self.manager.export_active(&path) {
                    self.show_error(&format!("{:#}", err));
                }
            }
            MainWindowMsg::ImportBottle => {
                self.choose_import_archive(&sender);
            }
            MainWindowMsg::ImportArchiveChosen(path) => match self.manager.import_bottle(&path) {
                Ok(_) => sender.input(MainWindowMsg::RefreshBottles),
                Err(err) => self.show_error(&format!("{:#}", err)),
            },
            MainWindowMsg::ShowPreferences => {
                self.preferences_window
                    .emit(PreferencesWindowMsg::Show(self.manager.config().clone()));
            }
            MainWindowMsg::PreferencesSaved(config) => {
                if let Err(err) = self.manager.save_config(config) {
                    self.show_error(&format!("{:#}", err));
                }
                sender.input(MainWindowMsg::RefreshBottles);
            }
            MainWindowMsg::ShowAbout => {
                about_dialog::show(&self.root_window);
            }
            MainWindowMsg::GiveFeedback => {
                self.give_feedback();
            }
            MainWindowMsg::Quit => {
                self.root_window.close();
            }
        }
    }
}
