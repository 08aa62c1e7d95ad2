pub mod about_dialog;
pub mod busy_dialog;
pub mod edit_window;
pub mod main_window;
pub mod menu;
pub mod new_bottle_dialog;
pub mod preferences_window;
pub mod settings_window;
