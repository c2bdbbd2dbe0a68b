use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Categorical mapping: stack key → Color32
// ---------------------------------------------------------------------------

/// Maps the keys of a stacked chart (property types) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        let keys: Vec<&String> = keys.into_iter().collect();
        let palette = generate_palette(keys.len());
        let mapping = keys
            .into_iter()
            .zip(palette)
            .map(|(k, c)| (k.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, key: &str) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }

    /// Return the legend entries (key → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping.iter().map(|(k, c)| (k.clone(), *c)).collect()
    }
}

// ---------------------------------------------------------------------------
// Sequential log scale for the choropleth
// ---------------------------------------------------------------------------

pub const NEUTRAL: Color32 = Color32::from_rgb(0xd7, 0xdc, 0xe0);
pub const HIGHLIGHT: Color32 = Color32::from_rgb(0xff, 0x00, 0x00);

/// Log-scaled ramp from light to dark blue over `[max(1, min), max]`.
#[derive(Debug, Clone, Copy)]
pub struct LogScale {
    lo: f64,
    hi: f64,
    light: LinSrgb,
    dark: LinSrgb,
}

impl LogScale {
    /// Domain from the positive values; `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite() && *v > 0.0)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })?;
        Some(LogScale {
            lo: min.max(1.0),
            hi: max.max(1.0),
            light: Srgb::new(0x68u8, 0xb0, 0xf7).into_format::<f32>().into_linear(),
            dark: Srgb::new(0x08u8, 0x30, 0x6b).into_format::<f32>().into_linear(),
        })
    }

    /// `(lightest, darkest)` value of the domain.
    pub fn domain(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Position of `value` in the domain, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.hi.ln() - self.lo.ln();
        if span <= f64::EPSILON {
            return 1.0;
        }
        ((value.max(1.0).ln() - self.lo.ln()) / span).clamp(0.0, 1.0)
    }

    /// Fill colour; zero or missing values are neutral grey.
    pub fn color(&self, value: f64) -> Color32 {
        if !(value.is_finite() && value > 0.0) {
            return NEUTRAL;
        }
        let t = self.position(value) as f32;
        to_color32(Srgb::from_linear(self.light.mix(self.dark, t)))
    }
}
