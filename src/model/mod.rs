//! Data model for annotation sessions.

mod crop;
mod geometry;
mod image;
mod polygon;

pub use crop::{CropRect, Handle, lock_aspect, parse_aspect_ratio};
pub use geometry::Point;
pub use image::ImageRef;
pub use polygon::{MIN_VERTICES, Polygon};
