//! Cropped-image export with sibling metadata.

use std::fs;
use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::ImageSize;
use crate::error::EditorError;
use crate::session::Session;

/// Corner coordinates normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Corner coordinates in whole image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// Center/size box normalized to the original image, the encoding
/// used by YOLO-style training labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoloBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Metadata written alongside a cropped image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropDocument {
    pub original_size: ImageSize,
    pub crop_coordinates_relative: RelativeBox,
    pub crop_coordinates_absolute: AbsoluteBox,
    pub yolo_format: YoloBox,
}

/// Crop the session image to its crop rectangle and build the
/// metadata document.
///
/// Fails with [`EditorError::NothingToExport`] when no crop rectangle
/// is set or the rectangle rounds to zero area.
pub fn export_crop(session: &Session) -> Result<(RgbaImage, CropDocument), EditorError> {
    let image = session
        .image
        .as_ref()
        .ok_or_else(|| EditorError::invalid_state("no image loaded"))?;
    let rect = session
        .crop
        .ok_or_else(|| EditorError::nothing_to_export("no crop region defined"))?;

    let (width, height) = (image.width(), image.height());
    // The rectangle is already normalized and clamped; rounding to
    // whole pixels can still collapse a sliver to nothing
    let x1 = (rect.x1.round() as u32).min(width);
    let y1 = (rect.y1.round() as u32).min(height);
    let x2 = (rect.x2.round() as u32).min(width);
    let y2 = (rect.y2.round() as u32).min(height);
    if x2 <= x1 || y2 <= y1 {
        return Err(EditorError::nothing_to_export("crop region has no area"));
    }

    let cropped = image::imageops::crop_imm(&image.pixels, x1, y1, x2 - x1, y2 - y1).to_image();

    let (fw, fh) = (width as f32, height as f32);
    let relative = RelativeBox {
        x1: x1 as f32 / fw,
        y1: y1 as f32 / fh,
        x2: x2 as f32 / fw,
        y2: y2 as f32 / fh,
    };
    let doc = CropDocument {
        original_size: ImageSize { width, height },
        crop_coordinates_relative: relative,
        crop_coordinates_absolute: AbsoluteBox { x1, y1, x2, y2 },
        yolo_format: YoloBox {
            center_x: (relative.x1 + relative.x2) / 2.0,
            center_y: (relative.y1 + relative.y2) / 2.0,
            width: relative.x2 - relative.x1,
            height: relative.y2 - relative.y1,
        },
    };
    Ok((cropped, doc))
}

/// Write the cropped image to `image_path` and the metadata JSON next
/// to it, with the extension swapped to `.json`.
pub fn write_crop(session: &Session, image_path: &Path) -> Result<CropDocument, EditorError> {
    let (cropped, doc) = export_crop(session)?;
    save_image(&cropped, image_path)?;

    let json_path = image_path.with_extension("json");
    fs::write(&json_path, serde_json::to_string_pretty(&doc)?)?;
    log::info!(
        "Saved crop {}x{} to {:?} with metadata {:?}",
        cropped.width(),
        cropped.height(),
        image_path,
        json_path
    );
    Ok(doc)
}

// JPEG has no alpha channel, so flatten first when saving there
fn save_image(pixels: &RgbaImage, path: &Path) -> Result<(), EditorError> {
    let jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    if jpeg {
        image::DynamicImage::ImageRgba8(pixels.clone()).to_rgb8().save(path)?;
    } else {
        pixels.save(path)?;
    }
    Ok(())
}
