use gtk4::prelude::*;
use gtk4::{Box, Dialog, Label, Orientation, ProgressBar, Window};
use relm4::RelmWidgetExt;
use std::cell::RefCell;
use std::time::Duration;

/// Modal "please wait" dialog with a pulsing bar, shown while a package
/// install runs in a bottle. Closed by the install-finished event.
pub struct BusyDialog {
    dialog: Dialog,
    message_label: Label,
    progress_bar: ProgressBar,
    timer: RefCell<Option<glib::SourceId>>,
}

impl BusyDialog {
    pub fn new(parent: &impl IsA<Window>) -> Self {
        let dialog = Dialog::builder()
            .title("Applying Changes")
            .modal(true)
            .deletable(false)
            .transient_for(parent)
            .default_width(400)
            .default_height(120)
            .build();

        let content = Box::new(Orientation::Vertical, 10);
        content.set_margin_all(10);

        let heading_label = Label::new(None);
        heading_label.set_markup("<big><b>Installing software</b></big>");
        heading_label.set_halign(gtk4::Align::Start);
        content.append(&heading_label);

        let message_label = Label::new(None);
        message_label.set_halign(gtk4::Align::Start);
        message_label.set_wrap(true);
        content.append(&message_label);

        let progress_bar = ProgressBar::new();
        progress_bar.set_pulse_step(0.3);
        content.append(&progress_bar);

        dialog.content_area().append(&content);

        Self {
            dialog,
            message_label,
            progress_bar,
            timer: RefCell::new(None),
        }
    }

    /// Present the dialog with a message and start pulsing
    pub fn show(&self, message: &str) {
        self.message_label
            .set_text(&format!("{} Please wait...", message));

        self.stop_timer();
        let progress_bar = self.progress_bar.clone();
        let source = glib::timeout_add_local(Duration::from_millis(200), move || {
            progress_bar.pulse();
            glib::ControlFlow::Continue
        });
        self.timer.borrow_mut().replace(source);

        self.dialog.present();
    }

    /// Stop pulsing and hide the dialog again
    pub fn close(&self) {
        self.stop_timer();
        self.dialog.set_visible(false);
    }

    fn stop_timer(&self) {
        if let Some(source) = self.timer.borrow_mut().take() {
            source.remove();
        }
    }
}
