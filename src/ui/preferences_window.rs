use gtk4::prelude::*;
use gtk4::{Box, Button, CheckButton, Entry, Label, Orientation, Window};
use relm4::{ComponentParts, ComponentSender, RelmWidgetExt, SimpleComponent};
use std::path::PathBuf;

use crate::core::config::AppConfig;

#[derive(Debug)]
pub enum PreferencesWindowMsg {
    /// Populate the inputs from the current config and present
    Show(AppConfig),
    Save,
    Close,
}

#[derive(Debug)]
pub enum PreferencesWindowOutput {
    Saved(AppConfig),
}

/// Application preferences: bottle directory and wine output tracing
pub struct PreferencesWindow {
    bottle_dir_entry: Entry,
    tracing_check: CheckButton,
    root_window: Window,
}

#[relm4::component(pub)]
impl SimpleComponent for PreferencesWindow {
    type Init = ();
    type Input = PreferencesWindowMsg;
    type Output = PreferencesWindowOutput;

    view! {
        #[root]
        Window {
            set_title: Some("Application Preferences"),
            set_modal: true,
            set_default_width: 650,
            set_default_height: 220,
            set_hide_on_close: true,

            #[wrap(Some)]
            set_child = &Box {
                set_orientation: Orientation::Vertical,
                set_spacing: 12,
                set_margin_all: 16,

                append = &Label {
                    set_label: "Application Preferences",
                    set_css_classes: &["app-title"],
                    set_halign: gtk4::Align::Start,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 10,
                    set_css_classes: &["card"],

                    append = &Label {
                        set_label: "Machine location:",
                    },

                    #[local_ref]
                    bottle_dir_entry -> Entry {
                        set_hexpand: true,
                    },
                },

                append = &Box {
                    set_orientation: Orientation::Vertical,
                    set_spacing: 6,
                    set_css_classes: &["card"],

                    #[local_ref]
                    tracing_check -> CheckButton {},

                    append = &Label {
                        set_label: "Logs the output of launched Windows programs at debug level.",
                        set_css_classes: &["muted"],
                        set_halign: gtk4::Align::Start,
                    },
                },

                append = &Box {
                    set_vexpand: true,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 10,
                    set_halign: gtk4::Align::End,

                    append = &Button {
                        set_label: "Cancel",
                        connect_clicked => PreferencesWindowMsg::Close,
                    },

                    append = &Button {
                        set_label: "Save",
                        set_css_classes: &["suggested-action"],
                        connect_clicked => PreferencesWindowMsg::Save,
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
        let bottle_dir_entry = Entry::new();
        let tracing_check = CheckButton::with_label("Enable command tracing");

        let model = PreferencesWindow {
            bottle_dir_entry: bottle_dir_entry.clone(),
            tracing_check: tracing_check.clone(),
            root_window: root.clone(),
        };

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            PreferencesWindowMsg::Show(config) => {
                self.bottle_dir_entry
                    .set_text(&config.bottle_dir.to_string_lossy());
                self.tracing_check.set_active(config.enable_tracing);
                self.root_window.present();
            }
            PreferencesWindowMsg::Save => {
                let config = AppConfig {
                    bottle_dir: PathBuf::from(self.bottle_dir_entry.text().as_str()),
                    enable_tracing: self.tracing_check.is_active(),
                };
                let _ = sender.output(PreferencesWindowOutput::Saved(config));
                self.root_window.set_visible(false);
            }
            PreferencesWindowMsg::Close => {
                self.root_window.set_visible(false);
            }
        }
    }
}
