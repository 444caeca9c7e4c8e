//! Display colors.

use serde::Serialize;

/// RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// 8-bit channels, for terminals and image writers
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let scale = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }

    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

// 0xF2 / 255 etc., matching the facet plot palette
pub const UNPROCESSED: Rgba = Rgba::opaque(0.949, 0.949, 0.949);
pub const PROCESSING: Rgba = Rgba::opaque(0.949, 0.961, 0.663);
pub const ERROR: Rgba = Rgba::opaque(0.961, 0.663, 0.663);
pub const SELFCAL_FAILED: Rgba = Rgba::opaque(0.643, 0.643, 0.643);
/// Legend swatch for verified self-calibration; directions are shaded by count instead
pub const SELFCAL_OK: Rgba = Rgba::opaque(0.663, 0.961, 0.663);

/// Shade for a direction with `count` completed steps.
///
/// Brightness falls with the square root of the count; a count of zero is
/// treated as one.
pub fn completed_color(count: u32) -> Rgba {
    let scale = (count.max(1) as f64).sqrt();
    Rgba::opaque(0.66 / scale, 0.96 / scale, 0.66 / scale)
}
