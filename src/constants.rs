//! Interaction thresholds and rendering constants.
//!
//! This module centralizes all hardcoded values for hit tolerances,
//! zoom limits, history sizing, and annotation styling.

use crate::color::Rgb;

/// Hit-test and close-detection thresholds, in image pixels.
pub mod threshold {
    /// Per-axis distance to the first vertex that closes a polygon
    pub const CLOSE_AXIS: f32 = 5.0;
    /// Euclidean distance to the first vertex that closes a polygon
    pub const CLOSE_RADIUS: f32 = 10.0;
    /// Per-axis tolerance for grabbing or selecting a vertex
    pub const VERTEX_HIT: f32 = 5.0;
    /// Per-axis tolerance for grabbing a crop resize handle
    pub const HANDLE_HIT: f32 = 8.0;
}

/// View transform limits.
pub mod zoom {
    /// Zoom increment/decrement factor
    pub const FACTOR: f32 = 1.2;
    /// Maximum zoom level
    pub const MAX: f32 = 5.0;
    /// Minimum zoom level
    pub const MIN: f32 = 0.2;
    /// Pan step size for keyboard navigation
    pub const PAN_STEP: f32 = 10.0;
}

/// Undo history sizing.
pub mod history {
    /// Maximum retained snapshots; the oldest entry is evicted beyond this
    pub const CAPACITY: usize = 50;
}

/// Polygon color generation parameters.
pub mod palette {
    /// Hue step between consecutive polygons (golden ratio conjugate)
    pub const HUE_STEP: f32 = 0.618_033_99;
    /// Fixed saturation for generated colors
    pub const SATURATION: f32 = 0.9;
    /// Fixed lightness for generated colors
    pub const LIGHTNESS: f32 = 0.5;
}

/// Stroke widths, marker sizes, and fixed colors for annotation styling.
pub mod style {
    use super::Rgb;

    /// Outline width for finalized polygons
    pub const STROKE_WIDTH: f32 = 2.0;
    /// Outline width for the selected polygon
    pub const SELECTED_STROKE_WIDTH: f32 = 4.0;
    /// Border width for the crop rectangle
    pub const CROP_STROKE_WIDTH: f32 = 3.0;
    /// Radius of vertex markers
    pub const MARKER_RADIUS: f32 = 5.0;
    /// Side length of crop resize handles
    pub const HANDLE_SIZE: f32 = 10.0;
    /// Text size for polygon labels
    pub const LABEL_SIZE: f32 = 14.0;
    /// Dash segment length for dashed strokes
    pub const DASH_LENGTH: f32 = 4.0;
    /// Gap length for dashed strokes
    pub const DASH_GAP: f32 = 2.0;
    /// Color for the in-progress polygon
    pub const DRAFT_COLOR: Rgb = Rgb([255, 0, 0]);
    /// Outline color for the selected polygon
    pub const HIGHLIGHT_COLOR: Rgb = Rgb([255, 255, 0]);
    /// Color for the crop rectangle border and handles
    pub const CROP_COLOR: Rgb = Rgb([0, 255, 0]);
    /// Color for polygon label text
    pub const LABEL_COLOR: Rgb = Rgb([255, 255, 255]);
}

/// Label placement search parameters.
pub mod label {
    /// Candidate offsets around a polygon's first vertex, in priority order
    pub const CANDIDATE_OFFSETS: [(f32, f32); 8] = [
        (0.0, -20.0),
        (20.0, -20.0),
        (20.0, 0.0),
        (20.0, 20.0),
        (0.0, 20.0),
        (-20.0, 20.0),
        (-20.0, 0.0),
        (-20.0, -20.0),
    ];
    /// Minimum clearance between a label anchor and any polygon vertex
    pub const CLEARANCE: f32 = 10.0;
    /// Offset above the first vertex used when every candidate collides
    pub const FALLBACK_OFFSET: (f32, f32) = (0.0, -15.0);
}
