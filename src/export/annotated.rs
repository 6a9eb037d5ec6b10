//! Burning polygon outlines into a copy of the session image.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::constants::style;
use crate::error::EditorError;
use crate::model::{Point, Polygon};
use crate::session::Session;

/// Render a copy of the image with every finalized polygon's outline
/// and vertex markers burned in, in the polygon's assigned color.
///
/// Label text is not rasterized; it stays in the JSON document. Fails
/// with [`EditorError::NothingToExport`] when no polygon has been
/// finalized.
pub fn render_annotated(session: &Session) -> Result<RgbaImage, EditorError> {
    let image = session
        .image
        .as_ref()
        .ok_or_else(|| EditorError::invalid_state("no image loaded"))?;
    if session.polygons.is_empty() {
        return Err(EditorError::nothing_to_export("no polygons to draw"));
    }

    let mut canvas = image.pixels.clone();
    for poly in &session.polygons {
        burn_polygon(&mut canvas, poly);
    }
    Ok(canvas)
}

/// Render and write the annotated image.
pub fn write_annotated(session: &Session, path: &Path) -> Result<(), EditorError> {
    let canvas = render_annotated(session)?;
    canvas.save(path)?;
    log::info!("Saved annotated image to {:?}", path);
    Ok(())
}

/// Conventional location for the annotated render belonging to a
/// polygon JSON file: same directory, stem suffixed `_annotated`.
pub fn annotated_path_for(json_path: &Path) -> PathBuf {
    let stem = json_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("annotations");
    json_path.with_file_name(format!("{stem}_annotated.png"))
}

fn burn_polygon(canvas: &mut RgbaImage, poly: &Polygon) {
    let [r, g, b] = poly.color.0;
    let color = Rgba([r, g, b, 255]);

    let n = poly.points.len();
    for i in 0..n {
        let a = poly.points[i];
        let z = poly.points[(i + 1) % n];
        burn_line(canvas, a, z, style::STROKE_WIDTH, color);
    }
    for &p in &poly.points {
        burn_disc(canvas, p, style::MARKER_RADIUS, color);
    }
}

// Samples the segment at sub-pixel steps and stamps a square brush,
// skipping anything outside the canvas
fn burn_line(canvas: &mut RgbaImage, a: Point, z: Point, thickness: f32, color: Rgba<u8>) {
    let dx = z.x - a.x;
    let dy = z.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i32;
    let half = (thickness / 2.0).max(0.5) as i32;
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        let cx = (a.x + dx * t) as i32;
        let cy = (a.y + dy * t) as i32;
        for oy in -half..=half {
            for ox in -half..=half {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

fn burn_disc(canvas: &mut RgbaImage, center: Point, radius: f32, color: Rgba<u8>) {
    let r = radius.ceil() as i32;
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let cx = center.x as i32;
    let cy = center.y as i32;

    for oy in -r..=r {
        for ox in -r..=r {
            if ((ox * ox + oy * oy) as f32) <= radius * radius {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}
