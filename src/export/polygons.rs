//! The polygon export document: absolute and normalized coordinates
//! side by side.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImageSize;
use crate::error::EditorError;
use crate::model::Polygon;
use crate::session::Session;

/// Everything written to a polygon JSON file.
///
/// `polygons_absolute` carries image-pixel coordinates;
/// `polygons_normalized` carries the same polygons with every
/// coordinate divided by the image width/height, so points land in
/// `[0, 1]` whenever they lie inside the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonDocument {
    pub image_path: String,
    pub image_size: ImageSize,
    pub polygons_absolute: Vec<Polygon>,
    pub polygons_normalized: Vec<Polygon>,
}

/// Build the polygon document for a session.
///
/// Fails with [`EditorError::NothingToExport`] when no polygon has
/// been finalized.
pub fn export_polygons(session: &Session) -> Result<PolygonDocument, EditorError> {
    let image = session
        .image
        .as_ref()
        .ok_or_else(|| EditorError::invalid_state("no image loaded"))?;
    if session.polygons.is_empty() {
        return Err(EditorError::nothing_to_export("no polygons to save"));
    }

    let (width, height) = (image.width(), image.height());
    let normalized = session
        .polygons
        .iter()
        .map(|p| p.normalized(width as f32, height as f32))
        .collect();

    Ok(PolygonDocument {
        image_path: image.path_string(),
        image_size: ImageSize { width, height },
        polygons_absolute: session.polygons.clone(),
        polygons_normalized: normalized,
    })
}

/// Build the document and write it as pretty-printed JSON.
pub fn write_polygons(session: &Session, path: &Path) -> Result<PolygonDocument, EditorError> {
    let doc = export_polygons(session)?;
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    log::info!(
        "Saved {} polygons to {:?}",
        doc.polygons_absolute.len(),
        path
    );
    Ok(doc)
}

/// Read back a previously written polygon document.
pub fn read_polygon_document(path: &Path) -> Result<PolygonDocument, EditorError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
