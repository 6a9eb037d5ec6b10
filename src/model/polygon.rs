//! Labeled polygon annotations.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::color::Rgb;

/// Minimum number of vertices for a finalized polygon.
pub const MIN_VERTICES: usize = 3;

/// A finalized, labeled polygon.
///
/// Invariants: `points` keeps drawing order and holds at least
/// [`MIN_VERTICES`] entries, `id` is positive and unique within its
/// session, `label` is non-empty. The invariants are enforced at
/// finalize time, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices in drawing order
    pub points: Vec<Point>,
    /// User-assigned label
    pub label: String,
    /// User-assigned identifier, unique within the session
    pub id: u32,
    /// Assigned display color
    pub color: Rgb,
}

impl Polygon {
    /// Create a polygon from its parts.
    pub fn new(points: Vec<Point>, label: impl Into<String>, id: u32, color: Rgb) -> Self {
        Self {
            points,
            label: label.into(),
            id,
            color,
        }
    }

    /// Ray-casting point-in-polygon test.
    pub fn contains(&self, point: &Point) -> bool {
        let n = self.points.len();
        if n < MIN_VERTICES {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.points[i].x, self.points[i].y);
            let (xj, yj) = (self.points[j].x, self.points[j].y);
            if ((yi > point.y) != (yj > point.y))
                && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Index of the first vertex within `tolerance` of `point` on both axes.
    pub fn hit_vertex(&self, point: &Point, tolerance: f32) -> Option<usize> {
        self.points
            .iter()
            .position(|v| v.axis_distance(point) <= tolerance)
    }

    /// Translate every vertex by the given deltas.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        for p in &mut self.points {
            *p = p.translated(dx, dy);
        }
    }

    /// A copy with every coordinate divided by the image dimensions.
    pub fn normalized(&self, width: f32, height: f32) -> Polygon {
        Polygon {
            points: self
                .points
                .iter()
                .map(|p| Point::new(p.x / width, p.y / height))
                .collect(),
            label: self.label.clone(),
            id: self.id,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(
            vec![
                Point::new(10.0, 10.0),
                Point::new(110.0, 10.0),
                Point::new(110.0, 110.0),
                Point::new(10.0, 110.0),
            ],
            "square",
            1,
            Rgb([255, 0, 0]),
        )
    }

    #[test]
    fn test_contains_inside_and_outside() {
        let poly = square();
        assert!(poly.contains(&Point::new(60.0, 60.0)));
        assert!(!poly.contains(&Point::new(200.0, 60.0)));
        assert!(!poly.contains(&Point::new(60.0, 5.0)));
    }

    #[test]
    fn test_hit_vertex_tolerance() {
        let poly = square();
        assert_eq!(poly.hit_vertex(&Point::new(112.0, 13.0), 5.0), Some(1));
        assert_eq!(poly.hit_vertex(&Point::new(116.0, 10.0), 5.0), None);
    }

    #[test]
    fn test_translate_moves_all_points() {
        let mut poly = square();
        poly.translate(5.0, -5.0);
        assert_eq!(poly.points[0], Point::new(15.0, 5.0));
        assert_eq!(poly.points[2], Point::new(115.0, 105.0));
    }

    #[test]
    fn test_normalized_divides_by_dimensions() {
        let poly = square();
        let norm = poly.normalized(200.0, 400.0);
        assert!((norm.points[0].x - 0.05).abs() < 1e-6);
        assert!((norm.points[0].y - 0.025).abs() < 1e-6);
        assert_eq!(norm.label, poly.label);
        assert_eq!(norm.id, poly.id);
    }
}
