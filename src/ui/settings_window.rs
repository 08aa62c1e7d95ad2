use gtk4::prelude::*;
use gtk4::{Box, Button, Image, Label, Orientation, Window};
use relm4::{ComponentParts, ComponentSender, RelmWidgetExt, SimpleComponent};

use crate::core::bottle::Bottle;
use crate::core::bottle_manager::{InstalledPackages, Tool};
use crate::core::winetricks::Package;

#[derive(Debug)]
pub enum SettingsWindowMsg {
    Show,
    SetActiveBottle(Bottle),
    ResetActiveBottle,
    /// Fresh install-state snapshot from the manager
    UpdateInstalled(InstalledPackages),
    Install(Package),
    OpenTool(Tool),
    Close,
}

#[derive(Debug)]
pub enum SettingsWindowOutput {
    Install(Package),
    OpenTool(Tool),
}

/// Per-bottle settings window: component package installs and Wine
/// maintenance tools. Button labels flip between Install and Reinstall
/// based on the bottle's registry state.
pub struct SettingsWindow {
    active_bottle: Option<Bottle>,
    installed: InstalledPackages,
    root_window: Window,
}

impl SettingsWindow {
    fn title(&self) -> String {
        match &self.active_bottle {
            Some(bottle) => format!("Settings of machine - {}", bottle.name),
            None => "Settings for machine (Unknown machine)".to_string(),
        }
    }
}

fn install_label(installed: bool, what: &str) -> String {
    if installed {
        format!("Reinstall {}", what)
    } else {
        format!("Install {}", what)
    }
}

#[relm4::component(pub)]
impl SimpleComponent for SettingsWindow {
    type Init = ();
    type Input = SettingsWindowMsg;
    type Output = SettingsWindowOutput;

    view! {
        #[root]
        Window {
            #[watch]
            set_title: Some(&model.title()),
            set_modal: true,
            set_default_width: 850,
            set_default_height: 540,
            set_hide_on_close: true,

            #[wrap(Some)]
            set_child = &Box {
                set_orientation: Orientation::Vertical,
                set_spacing: 12,
                set_margin_all: 16,

                append = &Label {
                    set_label: "Gaming packages",
                    set_css_classes: &["section-title"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 8,
                    set_halign: gtk4::Align::Center,
                    set_css_classes: &["card"],
                    #[watch]
                    set_sensitive: model.active_bottle.is_some(),

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.d3dx9, "DirectX v9 (OpenGL)"),
                        set_tooltip_text: Some("Installs MS D3DX9: Ideal for DirectX 9 games, by using OpenGL API"),
                        connect_clicked => SettingsWindowMsg::Install(Package::D3dx9 { version: None }),
                    },

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.dxvk, "DirectX v9/v10/v11 (Vulkan)"),
                        set_tooltip_text: Some("Installs DXVK: Ideal for DirectX 9/10/11 games, by using Vulkan API"),
                        connect_clicked => SettingsWindowMsg::Install(Package::Dxvk { version: None }),
                    },
                },

                append = &Label {
                    set_markup: "<b>Hint:</b> Hover the mouse over the buttons for more info...",
                    set_css_classes: &["muted"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Label {
                    set_label: "Additional packages",
                    set_css_classes: &["section-title"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 8,
                    set_halign: gtk4::Align::Center,
                    set_css_classes: &["card"],
                    #[watch]
                    set_sensitive: model.active_bottle.is_some(),

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.liberation_fonts, "Liberation fonts"),
                        set_tooltip_text: Some("Installs Liberation open-source Fonts, alternative for Core fonts"),
                        connect_clicked => SettingsWindowMsg::Install(Package::LiberationFonts),
                    },

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.core_fonts, "Core Fonts"),
                        set_tooltip_text: Some("Installs Microsoft Core Fonts"),
                        connect_clicked => SettingsWindowMsg::Install(Package::CoreFonts),
                    },

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.visual_cpp, "Visual C++ 2013"),
                        set_tooltip_text: Some("Installs Visual C++ 2013 package"),
                        connect_clicked => SettingsWindowMsg::Install(Package::VisualCpp { year: "2013".to_string() }),
                    },

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.dotnet4, ".NET v4"),
                        set_tooltip_text: Some("Installs .NET 4.0"),
                        connect_clicked => SettingsWindowMsg::Install(Package::DotNet { version: "40".to_string() }),
                    },

                    append = &Button {
                        #[watch]
                        set_label: &install_label(model.installed.dotnet452, ".NET v4.5.2"),
                        set_tooltip_text: Some("Installs .NET 4.0 and .NET 4.5.2"),
                        connect_clicked => SettingsWindowMsg::Install(Package::DotNet { version: "452".to_string() }),
                    },
                },

                append = &Label {
                    set_label: "Supporting Tools",
                    set_css_classes: &["section-title"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 8,
                    set_halign: gtk4::Align::Center,
                    set_css_classes: &["card"],
                    #[watch]
                    set_sensitive: model.active_bottle.is_some(),

                    append = &Button {
                        set_label: "Uninstaller",
                        set_tooltip_text: Some("Open Wine uninstaller"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Uninstaller),
                    },

                    append = &Button {
                        set_label: "Notepad",
                        set_tooltip_text: Some("Open Notepad Editor"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Notepad),
                    },

                    append = &Button {
                        set_label: "Wordpad",
                        set_tooltip_text: Some("Open Wordpad"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Wordpad),
                    },

                    append = &Button {
                        set_label: "Internet Explorer",
                        set_tooltip_text: Some("Open Internet Explorer"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::InternetExplorer),
                    },

                    append = &Button {
                        set_label: "Task manager",
                        set_tooltip_text: Some("Open Wine task manager"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::TaskManager),
                    },

                    append = &Button {
                        set_label: "Registry Editor",
                        set_tooltip_text: Some("Open Windows Registry editor (For advanced users!)"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::RegistryEditor),
                    },
                },

                append = &Label {
                    set_label: "Fallback Tools",
                    set_css_classes: &["section-title"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 8,
                    set_halign: gtk4::Align::Center,
                    set_css_classes: &["card"],
                    #[watch]
                    set_sensitive: model.active_bottle.is_some(),

                    append = &Button {
                        set_label: "Explorer",
                        set_tooltip_text: Some("Open Explorer"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Explorer),
                    },

                    append = &Button {
                        set_label: "Console",
                        set_tooltip_text: Some("Open Windows cmd"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Console),
                    },

                    append = &Button {
                        set_label: "WineCfg",
                        set_tooltip_text: Some("FALLBACK: Open winecfg GUI"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::Winecfg),
                    },

                    append = &Button {
                        set_label: "Winetricks",
                        set_tooltip_text: Some("FALLBACK: Winetricks GUI"),
                        connect_clicked => SettingsWindowMsg::OpenTool(Tool::WinetricksGui),
                    },
                },

                append = &Box {
                    set_vexpand: true,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 8,
                    set_halign: gtk4::Align::End,

                    append = &Image {
                        set_icon_name: Some("preferences-other-symbolic"),
                        set_pixel_size: 16,
                    },

                    append = &Button {
                        set_label: "Close",
                        connect_clicked => SettingsWindowMsg::Close,
                    },
                },
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        _sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let model = SettingsWindow {
            active_bottle: None,
            installed: InstalledPackages::default(),
            root_window: root.clone(),
        };

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            SettingsWindowMsg::Show => {
                self.root_window.present();
            }
            SettingsWindowMsg::SetActiveBottle(bottle) => {
                self.active_bottle = Some(bottle);
            }
            SettingsWindowMsg::ResetActiveBottle => {
                self.active_bottle = None;
                self.installed = InstalledPackages::default();
            }
            SettingsWindowMsg::UpdateInstalled(installed) => {
                self.installed = installed;
            }
            SettingsWindowMsg::Install(package) => {
                let _ = sender.output(SettingsWindowOutput::Install(package));
            }
            SettingsWindowMsg::OpenTool(tool) => {
                let _ = sender.output(SettingsWindowOutput::OpenTool(tool));
            }
            SettingsWindowMsg::Close => {
                self.root_window.set_visible(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_flip_between_install_and_reinstall() {
        assert_eq!(install_label(false, "Core Fonts"), "Install Core Fonts");
        assert_eq!(install_label(true, "Core Fonts"), "Reinstall Core Fonts");
    }
}
