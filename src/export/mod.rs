//! Export artifacts for a finished session: polygon JSON documents,
//! cropped images with sibling metadata, and annotated image renders.
//!
//! Exporters read the session and never mutate it. Every document
//! type serializes with serde and round-trips through its JSON form.

mod annotated;
mod crop;
mod polygons;

pub use annotated::{annotated_path_for, render_annotated, write_annotated};
pub use crop::{AbsoluteBox, CropDocument, RelativeBox, YoloBox, export_crop, write_crop};
pub use polygons::{PolygonDocument, export_polygons, read_polygon_document, write_polygons};

use serde::{Deserialize, Serialize};

/// Width and height of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}
