use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use texeval2mtex::data::profile::{MetadataValue, Profile, ProfileDataset};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Profile plot (central panel)
// ---------------------------------------------------------------------------

/// Axis labels for the visible profiles.  Rings and fibres have different
/// abscissae, so a mixed selection gets generic labels.
fn axis_labels(dataset: &ProfileDataset, visible: &[usize]) -> (&'static str, &'static str) {
    let kind_of = |p: &Profile| match p.metadata.get("kind") {
        Some(MetadataValue::String(k)) => k.as_str() == "fibre",
        _ => false,
    };
    let mut fibres = visible.iter().map(|&i| kind_of(&dataset.profiles[i]));
    match fibres.next() {
        Some(first) if fibres.all(|f| f == first) => {
            if first {
                ("Sample along fibre", "f(g)")
            } else {
                ("Azimuth (°)", "Intensity")
            }
        }
        _ => ("x", "Value"),
    }
}

fn scaled(y: &[f64]) -> Vec<f64> {
    let min = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        vec![0.0; y.len()]
    } else {
        y.iter().map(|&yi| (yi - min) / range).collect()
    }
}

/// Render the profile plot in the central panel.
pub fn profile_plot(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open .dat or fibre .csv files to plot them  (File → Open…)");
            });
            return;
        }
    };

    let color_map = &state.color_map;
    let color_col = state.color_column.as_deref();
    let (x_label, y_label) = axis_labels(dataset, &state.visible_indices);

    Plot::new("profile_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible_indices {
                let profile = &dataset.profiles[idx];

                let color = color_col
                    .and_then(|col| {
                        let val = profile.metadata.get(col)?;
                        let cm = color_map.as_ref()?;
                        Some(cm.color_for(val))
                    })
                    .unwrap_or(Color32::LIGHT_BLUE);

                // Legend entries are grouped by the colour column value.
                let name = color_col
                    .and_then(|col| profile.metadata.get(col))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| format!("profile {idx}"));

                let y_values = if state.minmax_scaling {
                    scaled(&profile.y)
                } else {
                    profile.y.clone()
                };

                let points: PlotPoints = profile
                    .x
                    .iter()
                    .zip(y_values.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                plot_ui.line(Line::new(points).name(&name).color(color).width(1.5));
            }
        });
}
