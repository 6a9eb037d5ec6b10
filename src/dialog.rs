//! File-pick and confirmation dialogs behind a swappable interface.
//!
//! The controller and exporters never open dialogs themselves; the
//! shell asks a [`Dialogs`] implementation and passes results on.
//! Tests substitute a scripted implementation, so nothing here needs
//! a display to be exercised.

use std::path::{Path, PathBuf};

/// Extensions offered by the image-open dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"];

/// The modal interactions the editor needs from its environment.
pub trait Dialogs {
    /// Pick an image file to annotate. `None` means cancelled.
    fn pick_image(&self, start_dir: Option<&Path>) -> Option<PathBuf>;

    /// Pick a previously exported polygon document.
    fn pick_polygon_document(&self, start_dir: Option<&Path>) -> Option<PathBuf>;

    /// Choose where to write a JSON document.
    fn save_json(&self, start_dir: Option<&Path>, default_name: &str) -> Option<PathBuf>;

    /// Choose where to write an image file.
    fn save_image(&self, start_dir: Option<&Path>, default_name: &str) -> Option<PathBuf>;

    /// Ask a yes/no question; `true` means confirmed.
    fn confirm(&self, title: &str, message: &str) -> bool;

    /// Show a warning the user has to acknowledge.
    fn warn(&self, title: &str, message: &str);
}

/// Native dialogs via rfd.
#[derive(Debug, Default)]
pub struct NativeDialogs;

impl NativeDialogs {
    fn file_dialog(start_dir: Option<&Path>) -> rfd::FileDialog {
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog
    }
}

impl Dialogs for NativeDialogs {
    fn pick_image(&self, start_dir: Option<&Path>) -> Option<PathBuf> {
        Self::file_dialog(start_dir)
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
    }

    fn pick_polygon_document(&self, start_dir: Option<&Path>) -> Option<PathBuf> {
        Self::file_dialog(start_dir)
            .add_filter("Polygon documents", &["json"])
            .pick_file()
    }

    fn save_json(&self, start_dir: Option<&Path>, default_name: &str) -> Option<PathBuf> {
        Self::file_dialog(start_dir)
            .add_filter("JSON", &["json"])
            .set_file_name(default_name)
            .save_file()
    }

    fn save_image(&self, start_dir: Option<&Path>, default_name: &str) -> Option<PathBuf> {
        Self::file_dialog(start_dir)
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .set_file_name(default_name)
            .save_file()
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::OkCancel)
            .show()
            == rfd::MessageDialogResult::Ok
    }

    fn warn(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
