//! Polycrop - interactive polygon and crop annotation for images.
//!
//! The core is headless: session state, the interaction controller,
//! undo history, scene rendering to draw commands, and the JSON/image
//! exporters are plain types exercised without a window. The desktop
//! shell in [`app`] glues them to eframe, rfd dialogs, and the
//! filesystem.

pub mod app;
pub mod color;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dialog;
pub mod error;
pub mod export;
pub mod history;
pub mod keybindings;
pub mod model;
pub mod render;
pub mod session;

pub use app::App;
pub use controller::Editor;
pub use error::EditorError;
pub use session::{Mode, Session};
