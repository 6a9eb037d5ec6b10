//! Color types and generation utilities.
//!
//! This module provides the RGB color type used by polygons, the HSL
//! conversion helper, and the deterministic per-polygon color generator.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::palette;

/// An RGB color with 8-bit channels.
///
/// Serializes as a `#rrggbb` hex string, which is the form used in
/// exported JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Format as a `#rrggbb` hex string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }

    /// Parse a `#rrggbb` hex string. Returns `None` for malformed input.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb([r, g, b]))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color '{s}'")))
    }
}

/// Convert HSL to RGB.
///
/// # Arguments
/// * `h` - Hue as a fraction of a turn (0.0-1.0)
/// * `s` - Saturation (0.0-1.0)
/// * `l` - Lightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(1.0) * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if hp < 1.0 {
        (c, x, 0.0)
    } else if hp < 2.0 {
        (x, c, 0.0)
    } else if hp < 3.0 {
        (0.0, c, x)
    } else if hp < 4.0 {
        (0.0, x, c)
    } else if hp < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Color for the polygon created at the given index.
///
/// Hues advance by the golden ratio conjugate per index, which keeps
/// consecutive colors far apart on the wheel. The sequence is a pure
/// function of the index, so the same creation order always produces
/// the same colors.
pub fn polygon_color(index: usize) -> Rgb {
    let hue = (index as f32 * palette::HUE_STEP).fract();
    let (r, g, b) = hsl_to_rgb(hue, palette::SATURATION, palette::LIGHTNESS);
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
}
