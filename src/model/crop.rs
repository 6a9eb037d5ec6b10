//! Crop rectangle, its resize handles, and aspect-ratio helpers.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::error::EditorError;

/// One of the eight draggable control points used to resize the crop
/// rectangle: four corners plus four edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
    North,
    South,
    East,
    West,
}

impl Handle {
    /// All handles, in hit-test priority order (corners before edges).
    pub fn all() -> &'static [Handle] {
        &[
            Handle::NorthWest,
            Handle::NorthEast,
            Handle::SouthEast,
            Handle::SouthWest,
            Handle::North,
            Handle::South,
            Handle::East,
            Handle::West,
        ]
    }

    /// Fractional position of this handle on the rectangle, with
    /// (0, 0) at the x1/y1 corner and (1, 1) at the x2/y2 corner.
    ///
    /// A factor of 0 or 1 marks the edge the handle drives; 0.5 means
    /// the handle leaves that axis alone.
    pub fn factors(&self) -> (f32, f32) {
        match self {
            Handle::NorthWest => (0.0, 0.0),
            Handle::NorthEast => (1.0, 0.0),
            Handle::SouthEast => (1.0, 1.0),
            Handle::SouthWest => (0.0, 1.0),
            Handle::North => (0.5, 0.0),
            Handle::South => (0.5, 1.0),
            Handle::East => (1.0, 0.5),
            Handle::West => (0.0, 0.5),
        }
    }
}

/// An axis-aligned crop region in image pixel space.
///
/// `x1 ≤ x2` and `y1 ≤ y2` hold once [`CropRect::finalized`] has run;
/// while a drag is in flight the corners may be in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CropRect {
    /// Create a rectangle from raw bounds.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle spanned by two corners, in the order given.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    /// Whether the point lies inside the rectangle (corner order agnostic).
    pub fn contains(&self, p: &Point) -> bool {
        let (lo_x, hi_x) = (self.x1.min(self.x2), self.x1.max(self.x2));
        let (lo_y, hi_y) = (self.y1.min(self.y2), self.y1.max(self.y2));
        p.x >= lo_x && p.x <= hi_x && p.y >= lo_y && p.y <= hi_y
    }

    /// Position of a resize handle on this rectangle.
    pub fn handle_position(&self, handle: Handle) -> Point {
        let (fx, fy) = handle.factors();
        Point::new(
            self.x1 + (self.x2 - self.x1) * fx,
            self.y1 + (self.y2 - self.y1) * fy,
        )
    }

    /// The first handle within `tolerance` of the point on both axes.
    pub fn hit_handle(&self, p: &Point, tolerance: f32) -> Option<Handle> {
        Handle::all()
            .iter()
            .copied()
            .find(|h| self.handle_position(*h).axis_distance(p) <= tolerance)
    }

    /// Resized copy: the edges the handle drives move by the drag
    /// delta, the opposite edges stay fixed.
    pub fn resized(&self, handle: Handle, dx: f32, dy: f32) -> CropRect {
        let (fx, fy) = handle.factors();
        let mut r = *self;
        if fx == 0.0 {
            r.x1 += dx;
        } else if fx == 1.0 {
            r.x2 += dx;
        }
        if fy == 0.0 {
            r.y1 += dy;
        } else if fy == 1.0 {
            r.y2 += dy;
        }
        r
    }

    /// Copy translated so its x1/y1 corner sits at `(x, y)`, clamped
    /// to keep the whole rectangle inside `width` × `height`.
    pub fn moved_to(&self, x: f32, y: f32, width: f32, height: f32) -> CropRect {
        let w = self.width();
        let h = self.height();
        let nx = x.clamp(0.0, (width - w).max(0.0));
        let ny = y.clamp(0.0, (height - h).max(0.0));
        CropRect::new(nx, ny, nx + w, ny + h)
    }

    /// Normalize corner order, then clamp all bounds into the image.
    pub fn finalized(&self, width: f32, height: f32) -> CropRect {
        let (x1, x2) = if self.x1 <= self.x2 {
            (self.x1, self.x2)
        } else {
            (self.x2, self.x1)
        };
        let (y1, y2) = if self.y1 <= self.y2 {
            (self.y1, self.y2)
        } else {
            (self.y2, self.y1)
        };
        CropRect::new(
            x1.clamp(0.0, width),
            y1.clamp(0.0, height),
            x2.clamp(0.0, width),
            y2.clamp(0.0, height),
        )
    }
}

/// Constrain a drag delta to an aspect ratio.
///
/// The axis with the larger magnitude drives and the other axis is
/// recomputed from it, so dragging mostly sideways adjusts the height
/// to match and vice versa.
pub fn lock_aspect(dx: f32, dy: f32, aspect: f32) -> (f32, f32) {
    if dx.abs() > dy.abs() {
        (dx, dx / aspect)
    } else {
        (dy * aspect, dy)
    }
}

/// Parse a "W:H" aspect ratio string such as "16:9" into a ratio.
pub fn parse_aspect_ratio(s: &str) -> Result<f32, EditorError> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(EditorError::validation(
            "aspect ratio",
            format!("expected W:H, got '{}'", s.trim()),
        ));
    }
    let parse_side = |side: &str| -> Result<f32, EditorError> {
        side.trim().parse().map_err(|_| {
            EditorError::validation("aspect ratio", format!("'{}' is not a number", side.trim()))
        })
    };
    let w = parse_side(parts[0])?;
    let h = parse_side(parts[1])?;
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(EditorError::validation(
            "aspect ratio",
            "both sides must be positive",
        ));
    }
    Ok(w / h)
}
