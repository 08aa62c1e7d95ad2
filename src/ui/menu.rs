use gtk4::gio;
use gtk4::prelude::*;
use gtk4::{ApplicationWindow, PopoverMenuBar};

/// One event per menu entry; no payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuEvent {
    Preferences,
    Quit,
    RefreshList,
    NewMachine,
    EditMachine,
    SettingsMachine,
    RemoveMachine,
    RunProgram,
    OpenCDrive,
    ExportMachine,
    ImportMachine,
    GiveFeedback,
    About,
}

/// Window-scoped action name for each menu event
fn action_entries() -> &'static [(&'static str, MenuEvent)] {
    &[
        ("preferences", MenuEvent::Preferences),
        ("quit", MenuEvent::Quit),
        ("refresh-list", MenuEvent::RefreshList),
        ("new-machine", MenuEvent::NewMachine),
        ("edit-machine", MenuEvent::EditMachine),
        ("settings-machine", MenuEvent::SettingsMachine),
        ("remove-machine", MenuEvent::RemoveMachine),
        ("run-program", MenuEvent::RunProgram),
        ("open-c-drive", MenuEvent::OpenCDrive),
        ("export-machine", MenuEvent::ExportMachine),
        ("import-machine", MenuEvent::ImportMachine),
        ("give-feedback", MenuEvent::GiveFeedback),
        ("about", MenuEvent::About),
    ]
}

/// The top menu bar. A view-only component: every selection is translated
/// into exactly one `MenuEvent` handed to the subscriber; domain calls stay
/// in the coordinator.
pub struct MenuBar {
    widget: PopoverMenuBar,
}

impl MenuBar {
    pub fn new(window: &ApplicationWindow, on_event: impl Fn(MenuEvent) + Clone + 'static) -> Self {
        for (name, event) in action_entries() {
            let action = gio::SimpleAction::new(name, None);
            let callback = on_event.clone();
            let event = *event;
            action.connect_activate(move |_, _| callback(event));
            window.add_action(&action);
        }

        let model = gio::Menu::new();

        let file_menu = gio::Menu::new();
        let file_top = gio::Menu::new();
        file_top.append(Some("Preferences"), Some("win.preferences"));
        file_menu.append_section(None, &file_top);
        let file_transfer = gio::Menu::new();
        file_transfer.append(Some("Export Machine..."), Some("win.export-machine"));
        file_transfer.append(Some("Import Machine..."), Some("win.import-machine"));
        file_menu.append_section(None, &file_transfer);
        let file_bottom = gio::Menu::new();
        file_bottom.append(Some("Exit"), Some("win.quit"));
        file_menu.append_section(None, &file_bottom);
        model.append_submenu(Some("_File"), &file_menu);

        let view_menu = gio::Menu::new();
        view_menu.append(Some("Refresh List"), Some("win.refresh-list"));
        model.append_submenu(Some("_View"), &view_menu);

        let machine_menu = gio::Menu::new();
        let machine_top = gio::Menu::new();
        machine_top.append(Some("New"), Some("win.new-machine"));
        machine_top.append(Some("Edit"), Some("win.edit-machine"));
        machine_top.append(Some("Settings"), Some("win.settings-machine"));
        machine_top.append(Some("Remove"), Some("win.remove-machine"));
        machine_menu.append_section(None, &machine_top);
        let machine_bottom = gio::Menu::new();
        machine_bottom.append(Some("Run Program..."), Some("win.run-program"));
        machine_bottom.append(Some("Open C: Drive"), Some("win.open-c-drive"));
        machine_menu.append_section(None, &machine_bottom);
        model.append_submenu(Some("_Machine"), &machine_menu);

        let help_menu = gio::Menu::new();
        help_menu.append(Some("Give Feedback"), Some("win.give-feedback"));
        help_menu.append(Some("About Cellar..."), Some("win.about"));
        model.append_submenu(Some("_Help"), &help_menu);

        let widget = PopoverMenuBar::from_model(Some(&model));

        Self { widget }
    }

    pub fn widget(&self) -> &PopoverMenuBar {
        &self.widget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_menu_event_has_exactly_one_action() {
        let entries = action_entries();
        let names: HashSet<_> = entries.iter().map(|(name, _)| *name).collect();
        let events: HashSet<_> = entries.iter().map(|(_, event)| *event).collect();
        assert_eq!(names.len(), entries.len());
        assert_eq!(events.len(), entries.len());
    }
}
