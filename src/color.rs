use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Continuous colour scale: score → Color32
// ---------------------------------------------------------------------------

/// Viridis anchor colours, low to high.
const VIRIDIS: [(u8, u8, u8); 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

fn anchor(i: usize) -> LinSrgb {
    let (r, g, b) = VIRIDIS[i];
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

/// Sample Viridis at `t` in `[0, 1]`, interpolating in linear RGB.
pub fn viridis(t: f64) -> Color32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = (scaled - lo as f64) as f32;

    let mixed = anchor(lo).mix(anchor(lo + 1), frac);
    let rgb: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Maps a numeric range onto Viridis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousColorScale {
    pub min: f64,
    pub max: f64,
}

impl ContinuousColorScale {
    /// Span the finite values; a flat or empty input gets a unit-wide range.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() {
            return Self { min: 0.0, max: 1.0 };
        }
        if (max - min).abs() < f64::EPSILON {
            return Self { min: min - 0.5, max: max + 0.5 };
        }
        Self { min, max }
    }

    /// Position of `value` within the range, in `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        if !value.is_finite() {
            return Color32::GRAY;
        }
        viridis(self.fraction(value))
    }

    /// `n` evenly spaced (value, colour) stops from min to max, for the colour bar.
    pub fn legend_entries(&self, n: usize) -> Vec<(f64, Color32)> {
        if n < 2 {
            return vec![(self.min, viridis(0.0))];
        }
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                (self.min + t * (self.max - self.min), viridis(t))
            })
            .collect()
    }
}
