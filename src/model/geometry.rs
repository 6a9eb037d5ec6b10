//! Geometric primitives shared by annotations and hit testing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 2D point in image pixel space.
///
/// Serializes as a two-element `[x, y]` array to match the exported
/// JSON point lists.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Chebyshev distance: the larger of the per-axis distances.
    ///
    /// Hit tolerances are specified per axis, so a point is "within
    /// 5px" of another when this is at most 5.
    pub fn axis_distance(&self, other: &Point) -> f32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// This point translated by the given deltas.
    pub fn translated(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.x, self.y).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = <(f32, f32)>::deserialize(deserializer)?;
        Ok(Point { x, y })
    }
}
