use gtk4::prelude::*;
use gtk4::{
    Box, Button, CheckButton, ComboBoxText, Entry, Label, Orientation, ProgressBar, Stack,
    StackTransitionType, Window,
};
use relm4::{ComponentParts, ComponentSender, RelmWidgetExt, SimpleComponent};
use std::time::Duration;

use crate::core::bottle_manager::NewBottleParams;
use crate::core::types::{
    AUDIO_DRIVERS, DEFAULT_AUDIO_DRIVER, DEFAULT_BIT, DEFAULT_VIRTUAL_DESKTOP_RESOLUTION,
    DEFAULT_WINDOWS, SUPPORTED_WINDOWS_VERSIONS,
};

const PAGE_FORM: &str = "form";
const PAGE_PROGRESS: &str = "progress";

#[derive(Debug)]
pub enum NewBottleDialogMsg {
    Show,
    NameChanged(String),
    VirtualDesktopToggled(bool),
    Create,
    Pulse,
    /// Creation worker reported back; on failure the coordinator shows the
    /// error, the dialog only resets itself.
    CreationFinished { ok: bool },
    Cancel,
}

#[derive(Debug)]
pub enum NewBottleDialogOutput {
    Create(NewBottleParams),
}

/// New machine assistant: name + Windows version, additional settings, and
/// a progress page while the worker creates the prefix.
pub struct NewBottleDialog {
    name_valid: bool,
    virtual_desktop_enabled: bool,
    creating: bool,
    progress: f64,
    pulse_timer: Option<glib::SourceId>,
    name_entry: Entry,
    windows_combo: ComboBoxText,
    audio_combo: ComboBoxText,
    virtual_desktop_check: CheckButton,
    resolution_entry: Entry,
    resolution_row: Box,
    gecko_mono_check: CheckButton,
    apply_label: Label,
    loading_bar: ProgressBar,
    stack: Stack,
    root_window: Window,
}

impl NewBottleDialog {
    /// Reset every input so a second run starts clean
    fn set_defaults(&mut self) {
        self.name_entry.set_text("");
        let default_index = SUPPORTED_WINDOWS_VERSIONS
            .iter()
            .position(|(win, bit)| *win == DEFAULT_WINDOWS && *bit == DEFAULT_BIT)
            .unwrap_or(0);
        self.windows_combo
            .set_active_id(Some(&default_index.to_string()));
        self.audio_combo.set_active_id(Some("0"));
        self.virtual_desktop_check.set_active(false);
        self.gecko_mono_check.set_active(false);
        self.resolution_entry
            .set_text(DEFAULT_VIRTUAL_DESKTOP_RESOLUTION);
        self.name_valid = false;
        self.virtual_desktop_enabled = false;
        self.progress = 0.0;
        self.stack.set_visible_child_name(PAGE_FORM);
        self.stop_pulse();
    }

    fn collect_params(&self) -> NewBottleParams {
        let (windows, bit) = self
            .windows_combo
            .active_id()
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(|index| SUPPORTED_WINDOWS_VERSIONS.get(index).copied())
            .unwrap_or((DEFAULT_WINDOWS, DEFAULT_BIT));

        let audio_driver = self
            .audio_combo
            .active_id()
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(|index| AUDIO_DRIVERS.get(index).copied())
            .unwrap_or(DEFAULT_AUDIO_DRIVER);

        let virtual_desktop_resolution = if self.virtual_desktop_enabled {
            Some(self.resolution_entry.text().to_string())
        } else {
            None
        };

        NewBottleParams {
            name: self.name_entry.text().to_string(),
            windows,
            bit,
            audio_driver,
            virtual_desktop_resolution,
            disable_gecko_mono: self.gecko_mono_check.is_active(),
        }
    }

    fn stop_pulse(&mut self) {
        if let Some(source) = self.pulse_timer.take() {
            source.remove();
        }
    }

    fn progress_text(&self) -> &'static str {
        if self.progress > 1.0 {
            "Almost done creating the new machine..."
        } else {
            "Please wait, changes are getting applied."
        }
    }
}

/// Feedback tick rate, slower when more settings have to be applied
fn pulse_interval_ms(params: &NewBottleParams) -> u64 {
    let mut interval = 300;
    if params.virtual_desktop_resolution.is_some() {
        interval += 90;
    }
    if params.windows != DEFAULT_WINDOWS {
        interval += 60;
    }
    if params.audio_driver != DEFAULT_AUDIO_DRIVER {
        interval += 90;
    }
    interval
}

#[relm4::component(pub)]
impl SimpleComponent for NewBottleDialog {
    type Init = ();
    type Input = NewBottleDialogMsg;
    type Output = NewBottleDialogOutput;

    view! {
        #[root]
        Window {
            set_title: Some("Create a New Machine"),
            set_modal: true,
            set_default_width: 640,
            set_default_height: 400,
            set_hide_on_close: true,

            #[wrap(Some)]
            set_child = &Box {
                set_orientation: Orientation::Vertical,
                set_spacing: 12,
                set_margin_all: 16,

                #[local_ref]
                stack -> Stack {},

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 10,
                    set_halign: gtk4::Align::End,

                    append = &Button {
                        set_label: "Cancel",
                        #[watch]
                        set_sensitive: !model.creating,
                        connect_clicked => NewBottleDialogMsg::Cancel,
                    },

                    append = &Button {
                        set_label: "Create",
                        set_css_classes: &["suggested-action"],
                        #[watch]
                        set_sensitive: model.name_valid && !model.creating,
                        connect_clicked => NewBottleDialogMsg::Create,
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
        let name_entry = Entry::new();
        name_entry.set_placeholder_text(Some("Enter machine name"));
        name_entry.set_hexpand(true);
        let entry_sender = sender.clone();
        name_entry.connect_changed(move |entry| {
            entry_sender.input(NewBottleDialogMsg::NameChanged(entry.text().to_string()));
        });

        let windows_combo = ComboBoxText::new();
        windows_combo.set_hexpand(true);
        for (index, (windows, bit)) in SUPPORTED_WINDOWS_VERSIONS.iter().enumerate() {
            windows_combo.append(Some(&index.to_string()), &format!("{} ({})", windows, bit));
        }

        let audio_combo = ComboBoxText::new();
        audio_combo.set_hexpand(true);
        for (index, driver) in AUDIO_DRIVERS.iter().enumerate() {
            audio_combo.append(Some(&index.to_string()), &driver.to_string());
        }

        let virtual_desktop_check = CheckButton::with_label("Enable Virtual Desktop Window");
        let check_sender = sender.clone();
        virtual_desktop_check.connect_toggled(move |check| {
            check_sender.input(NewBottleDialogMsg::VirtualDesktopToggled(check.is_active()));
        });

        let resolution_entry = Entry::new();
        resolution_entry.set_text(DEFAULT_VIRTUAL_DESKTOP_RESOLUTION);

        let gecko_mono_check = CheckButton::with_label("Disable Gecko & Mono");

        // Form page
        let form_page = Box::new(Orientation::Vertical, 12);

        let intro_label = Label::new(None);
        intro_label.set_markup(
            "<big><b>Create a New Machine</b></big>\n\
             Please use a descriptive name for the Windows machine, and select which Windows version you want to use.",
        );
        intro_label.set_halign(gtk4::Align::Start);
        form_page.append(&intro_label);

        let name_row = Box::new(Orientation::Horizontal, 12);
        name_row.append(&Label::new(Some("Name:")));
        name_row.append(&name_entry);
        form_page.append(&name_row);

        let windows_row = Box::new(Orientation::Horizontal, 12);
        windows_row.append(&Label::new(Some("Windows Version:")));
        windows_row.append(&windows_combo);
        form_page.append(&windows_row);

        let additional_label = Label::new(None);
        additional_label.set_markup(
            "<b>Additional settings</b>\n\
             If you do not know what these settings do, leave them at their defaults.",
        );
        additional_label.set_halign(gtk4::Align::Start);
        additional_label.set_margin_top(12);
        form_page.append(&additional_label);

        let audio_row = Box::new(Orientation::Horizontal, 12);
        audio_row.append(&Label::new(Some("Audio Driver:")));
        audio_row.append(&audio_combo);
        form_page.append(&audio_row);

        form_page.append(&virtual_desktop_check);

        let resolution_row = Box::new(Orientation::Horizontal, 12);
        resolution_row.append(&Label::new(Some("Window Resolution:")));
        resolution_row.append(&resolution_entry);
        form_page.append(&resolution_row);

        form_page.append(&gecko_mono_check);

        // Progress page
        let progress_page = Box::new(Orientation::Vertical, 12);
        progress_page.set_halign(gtk4::Align::Center);
        progress_page.set_valign(gtk4::Align::Center);

        let apply_label = Label::new(Some("Please wait, changes are getting applied."));
        progress_page.append(&apply_label);

        let loading_bar = ProgressBar::new();
        loading_bar.set_pulse_step(0.3);
        progress_page.append(&loading_bar);

        let stack = Stack::new();
        stack.set_vexpand(true);
        stack.set_transition_type(StackTransitionType::SlideLeftRight);
        stack.add_named(&form_page, Some(PAGE_FORM));
        stack.add_named(&progress_page, Some(PAGE_PROGRESS));

        // The resolution row only appears once the virtual desktop is enabled
        resolution_row.set_visible(false);

        let mut model = NewBottleDialog {
            name_valid: false,
            virtual_desktop_enabled: false,
            creating: false,
            progress: 0.0,
            pulse_timer: None,
            name_entry: name_entry.clone(),
            windows_combo,
            audio_combo,
            virtual_desktop_check,
            resolution_entry: resolution_entry.clone(),
            resolution_row,
            gecko_mono_check,
            apply_label,
            loading_bar,
            stack: stack.clone(),
            root_window: root.clone(),
        };
        model.set_defaults();

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            NewBottleDialogMsg::Show => {
                self.set_defaults();
                self.root_window.present();
            }
            NewBottleDialogMsg::NameChanged(text) => {
                self.name_valid = !text.trim().is_empty();
            }
            NewBottleDialogMsg::VirtualDesktopToggled(enabled) => {
                self.virtual_desktop_enabled = enabled;
                self.resolution_row.set_visible(enabled);
            }
            NewBottleDialogMsg::Create => {
                let params = self.collect_params();
                self.creating = true;
                self.progress = 0.0;
                self.loading_bar.set_fraction(0.0);
                self.apply_label.set_text(self.progress_text());
                self.stack.set_visible_child_name(PAGE_PROGRESS);

                let interval = pulse_interval_ms(&params);
                let pulse_sender = sender.clone();
                self.stop_pulse();
                self.pulse_timer = Some(glib::timeout_add_local(
                    Duration::from_millis(interval),
                    move || {
                        pulse_sender.input(NewBottleDialogMsg::Pulse);
                        glib::ControlFlow::Continue
                    },
                ));

                let _ = sender.output(NewBottleDialogOutput::Create(params));
            }
            NewBottleDialogMsg::Pulse => {
                if !self.creating {
                    return;
                }
                self.progress += 0.02;
                if self.progress <= 1.0 {
                    self.loading_bar.set_fraction(self.progress);
                } else {
                    self.loading_bar.pulse();
                }
                self.apply_label.set_text(self.progress_text());
            }
            NewBottleDialogMsg::CreationFinished { ok: _ } => {
                self.creating = false;
                self.stop_pulse();
                self.set_defaults();
                self.root_window.set_visible(false);
            }
            NewBottleDialogMsg::Cancel => {
                if !self.creating {
                    self.set_defaults();
                    self.root_window.set_visible(false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AudioDriver, Bit, WindowsVersion};

    fn params(windows: WindowsVersion, audio: AudioDriver, desktop: Option<&str>) -> NewBottleParams {
        NewBottleParams {
            name: "test".to_string(),
            windows,
            bit: Bit::Win64,
            audio_driver: audio,
            virtual_desktop_resolution: desktop.map(str::to_string),
            disable_gecko_mono: false,
        }
    }

    #[test]
    fn defaults_use_the_base_interval() {
        let p = params(DEFAULT_WINDOWS, DEFAULT_AUDIO_DRIVER, None);
        assert_eq!(pulse_interval_ms(&p), 300);
    }

    #[test]
    fn extra_settings_slow_the_feedback_down() {
        let p = params(WindowsVersion::WindowsXP, AudioDriver::Alsa, Some("1024x768"));
        assert_eq!(pulse_interval_ms(&p), 300 + 60 + 90 + 90);
    }
}
