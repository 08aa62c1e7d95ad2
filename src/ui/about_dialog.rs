use gtk4::prelude::*;
use gtk4::{AboutDialog, License, Window};

/// Application version, also printed by `cellar --version`
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Show the about dialog on top of the main window
pub fn show(parent: &impl IsA<Window>) {
    let dialog = AboutDialog::builder()
        .transient_for(parent)
        .modal(true)
        .program_name("Cellar")
        .version(version())
        .comments("Wine bottle manager for Linux")
        .license_type(License::Gpl30)
        .build();
    dialog.set_authors(&["Cellar Contributors"]);
    dialog.present();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_the_crate_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
        assert!(!version().is_empty());
    }
}
