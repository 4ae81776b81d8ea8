use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use texeval2mtex::data::profile::MetadataValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Blue-to-red ramp for `n` ordered values, so neighbouring polar rings get
/// neighbouring colours.
pub fn generate_gradient(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
            hsl_color(240.0 * (1.0 - t))
        })
        .collect()
}

fn hsl_color(hue: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, 0.75, 0.55).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Stop short of a full turn so the first and last hue differ.
            hsl_color((i as f32 / n as f32) * 300.0)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: metadata value → Color32
// ---------------------------------------------------------------------------

/// Maps unique metadata values of a chosen column to colours.  Numeric
/// columns (polar angle, sample count) follow a gradient in value order,
/// text columns (plane, file) get distinct hues.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<MetadataValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<MetadataValue>) -> Self {
        let numeric = unique_values.iter().all(|v| v.as_f64().is_some());
        let palette = if numeric {
            generate_gradient(unique_values.len())
        } else {
            generate_palette(unique_values.len())
        };
        let mapping = unique_values.iter().cloned().zip(palette).collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given metadata value.
    pub fn color_for(&self, value: &MetadataValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let colors = generate_palette(18);
        assert_eq!(colors.len(), 18);
        let unique: BTreeSet<_> = colors.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 18);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_unknown_value_is_gray() {
        let values: BTreeSet<_> = [MetadataValue::Integer(1)].into_iter().collect();
        let map = ColorMap::new("ring", &values);
        assert_ne!(map.color_for(&MetadataValue::Integer(1)), Color32::GRAY);
        assert_eq!(map.color_for(&MetadataValue::Integer(2)), Color32::GRAY);
    }

    #[test]
    fn test_numeric_column_follows_gradient() {
        let rings: BTreeSet<_> = [10.0, 0.0, 5.0].into_iter().map(MetadataValue::Float).collect();
        let map = ColorMap::new("polar", &rings);
        let ramp = generate_gradient(3);
        assert_eq!(map.color_for(&MetadataValue::Float(0.0)), ramp[0]);
        assert_eq!(map.color_for(&MetadataValue::Float(10.0)), ramp[2]);

        let planes: BTreeSet<_> = ["111", "200"]
            .into_iter()
            .map(|p| MetadataValue::String(p.into()))
            .collect();
        let map = ColorMap::new("plane", &planes);
        assert_eq!(map.color_for(&MetadataValue::String("200".into())), generate_palette(2)[1]);
    }
}
