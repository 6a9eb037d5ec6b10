//! Native entry point: configuration, logging, the startup dialogs,
//! and the eframe event loop.

use std::path::PathBuf;

use polycrop::app::{self, App};
use polycrop::config::AppConfig;
use polycrop::dialog::NativeDialogs;

fn main() -> eframe::Result<()> {
    let config = AppConfig::load_from_default_path().unwrap_or_default();

    // Config sets the default verbosity; RUST_LOG still wins.
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let image_arg = std::env::args().nth(1).map(PathBuf::from);
    let Some((image, mode)) = app::startup(&NativeDialogs, image_arg) else {
        log::info!("No image chosen, exiting");
        return Ok(());
    };

    let title = image
        .path
        .as_ref()
        .and_then(|path| path.file_name())
        .and_then(|name| name.to_str())
        .map(|name| format!("{} - {}", config.app_name, name))
        .unwrap_or_else(|| config.app_name.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(App::new(config, Box::new(NativeDialogs), image, mode)))),
    )
}
