//! Sequential blue color ramp for the need choropleth.

use serde::{Deserialize, Serialize};

/// Light to dark blue, evenly spaced over `[0, 1]`.
pub const RAMP_STOPS: [Rgb; 5] = [
    Rgb(0xef, 0xf3, 0xff),
    Rgb(0xbd, 0xd7, 0xe7),
    Rgb(0x6b, 0xae, 0xd6),
    Rgb(0x31, 0x82, 0xbd),
    Rgb(0x08, 0x51, 0x9c),
];

/// Color for regions without a score.
pub const NEUTRAL_COLOR: Rgb = Rgb(0xcc, 0xcc, 0xcc);

/// Opacity for regions without a score.
pub const FALLBACK_OPACITY: f64 = 0.05;

/// Opacity at a normalized score of zero.
pub const MIN_OPACITY: f64 = 0.1;

/// Opacity added between a normalized score of zero and one.
pub const OPACITY_RANGE: f64 = 0.75;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Fill color and opacity for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEncoding {
    /// `#rrggbb` fill color.
    pub color: String,
    /// Fill opacity.
    pub opacity: f64,
}

impl FillEncoding {
    /// Encoding for a normalized score in `[0, 1]`; out-of-range input is
    /// clamped.
    #[must_use]
    pub fn for_normalized(n: f64) -> Self {
        let n = clamp_unit(n);
        Self {
            color: ramp_color(n).to_hex(),
            opacity: OPACITY_RANGE.mul_add(n, MIN_OPACITY),
        }
    }

    /// Encoding for regions missing from the score map.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            color: NEUTRAL_COLOR.to_hex(),
            opacity: FALLBACK_OPACITY,
        }
    }
}

fn clamp_unit(n: f64) -> f64 {
    if n.is_finite() { n.clamp(0.0, 1.0) } else { 0.0 }
}

/// Linearly interpolates [`RAMP_STOPS`] at `n`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ramp_color(n: f64) -> Rgb {
    let n = clamp_unit(n);
    let segments = (RAMP_STOPS.len() - 1) as f64;
    let scaled = n * segments;
    let idx = (scaled.floor() as usize).min(RAMP_STOPS.len() - 2);
    let t = scaled - idx as f64;

    let lo = RAMP_STOPS[idx];
    let hi = RAMP_STOPS[idx + 1];
    let mix = |a: u8, b: u8| (f64::from(b) - f64::from(a)).mul_add(t, f64::from(a)).round() as u8;

    Rgb(mix(lo.0, hi.0), mix(lo.1, hi.1), mix(lo.2, hi.2))
}
