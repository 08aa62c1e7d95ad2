use gtk4::prelude::*;
use gtk4::{Box, Button, Entry, Image, Label, Orientation, Window};
use relm4::{ComponentParts, ComponentSender, RelmWidgetExt, SimpleComponent};

use crate::core::bottle::Bottle;

#[derive(Debug)]
pub enum EditWindowMsg {
    Show,
    SetActiveBottle(Bottle),
    ResetActiveBottle,
    NameChanged(String),
    Save,
    Delete,
    OpenWinecfg,
    Close,
}

#[derive(Debug)]
pub enum EditWindowOutput {
    Rename(String),
    DeleteRequested,
    OpenWinecfg,
}

/// Edit window for the active bottle: rename, delete, winecfg.
/// Holds its context by value; the coordinator broadcasts changes.
pub struct EditWindow {
    active_bottle: Option<Bottle>,
    name_text: String,
    name_entry: Entry,
    root_window: Window,
}

impl EditWindow {
    fn title(&self) -> String {
        match &self.active_bottle {
            Some(bottle) => format!("Edit Machine - {}", bottle.name),
            None => "Edit Machine (Unknown machine)".to_string(),
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for EditWindow {
    type Init = ();
    type Input = EditWindowMsg;
    type Output = EditWindowOutput;

    view! {
        #[root]
        Window {
            #[watch]
            set_title: Some(&model.title()),
            set_modal: true,
            set_default_width: 750,
            set_default_height: 320,
            set_hide_on_close: true,

            #[wrap(Some)]
            set_child = &Box {
                set_orientation: Orientation::Vertical,
                set_spacing: 16,
                set_margin_all: 20,

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 12,

                    append = &Image {
                        set_icon_name: Some("document-edit-symbolic"),
                        set_pixel_size: 28,
                    },

                    append = &Box {
                        set_orientation: Orientation::Vertical,
                        set_spacing: 4,

                        append = &Label {
                            set_label: "Edit Machine",
                            set_css_classes: &["app-title"],
                            set_halign: gtk4::Align::Start,
                        },

                        append = &Label {
                            set_label: "Rename the machine or remove it entirely.",
                            set_css_classes: &["muted"],
                            set_halign: gtk4::Align::Start,
                        },
                    },
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 10,
                    set_css_classes: &["card"],

                    append = &Label {
                        set_label: "Name:",
                    },

                    #[local_ref]
                    name_entry -> Entry {
                        set_hexpand: true,
                        #[watch]
                        set_sensitive: model.active_bottle.is_some(),
                    },

                    append = &Button {
                        set_label: "Save",
                        set_css_classes: &["suggested-action"],
                        #[watch]
                        set_sensitive: model.active_bottle.is_some() && !model.name_text.trim().is_empty(),
                        connect_clicked => EditWindowMsg::Save,
                    },
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_spacing: 10,
                    set_css_classes: &["card"],

                    append = &Button {
                        set_label: "WineCfg",
                        #[watch]
                        set_sensitive: model.active_bottle.is_some(),
                        connect_clicked => EditWindowMsg::OpenWinecfg,
                    },

                    append = &Box {
                        set_hexpand: true,
                    },

                    append = &Button {
                        set_label: "Delete Machine",
                        set_css_classes: &["destructive-action"],
                        #[watch]
                        set_sensitive: model.active_bottle.is_some(),
                        connect_clicked => EditWindowMsg::Delete,
                    },
                },

                append = &Box {
                    set_vexpand: true,
                },

                append = &Box {
                    set_orientation: Orientation::Horizontal,
                    set_halign: gtk4::Align::End,

                    append = &Button {
                        set_label: "Close",
                        connect_clicked => EditWindowMsg::Close,
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
        name_entry.set_placeholder_text(Some("Machine name"));

        let entry_sender = sender.clone();
        name_entry.connect_changed(move |entry| {
            entry_sender.input(EditWindowMsg::NameChanged(entry.text().to_string()));
        });

        let model = EditWindow {
            active_bottle: None,
            name_text: String::new(),
            name_entry: name_entry.clone(),
            root_window: root.clone(),
        };

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            EditWindowMsg::Show => {
                self.root_window.present();
            }
            EditWindowMsg::SetActiveBottle(bottle) => {
                self.name_entry.set_text(&bottle.name);
                self.active_bottle = Some(bottle);
            }
            EditWindowMsg::ResetActiveBottle => {
                self.active_bottle = None;
                self.name_entry.set_text("");
            }
            EditWindowMsg::NameChanged(text) => {
                self.name_text = text;
            }
            EditWindowMsg::Save => {
                if self.active_bottle.is_some() {
                    let _ = sender.output(EditWindowOutput::Rename(self.name_text.clone()));
                }
            }
            EditWindowMsg::Delete => {
                if self.active_bottle.is_some() {
                    let _ = sender.output(EditWindowOutput::DeleteRequested);
                }
            }
            EditWindowMsg::OpenWinecfg => {
                if self.active_bottle.is_some() {
                    let _ = sender.output(EditWindowOutput::OpenWinecfg);
                }
            }
            EditWindowMsg::Close => {
                self.root_window.set_visible(false);
            }
        }
    }
}
