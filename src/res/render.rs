//! Writing RES text.  Used to produce synthetic exports for demos and tests.

use super::format::{AngularGrid, Intensities, ResFormat};
use super::parser::{ResBlock, ResFile};

/// Render `file` in the layout described by `format`.
///
/// Preamble lines carry the title, the correction marker (or `NOCORR`) and
/// the step line; every block is its header followed by its rings, each ring
/// spread over `lines_per_ring` lines.
pub fn render_res(file: &ResFile, format: &ResFormat, title: &str) -> String {
    let mut preamble = vec!["*".to_string(); format.preamble_lines()];
    preamble[0] = title.to_string();

    preamble[format.correction_marker_line] = if file.has_corrected() {
        format!("{}  22", format.correction_marker)
    } else {
        "NOCORR".to_string()
    };

    let mut step_tokens =
        vec!["0".to_string(); format.polar_step_field.max(format.azimuth_step_field) + 1];
    step_tokens[0] = "STEP".to_string();
    step_tokens[format.polar_step_field] = format!("{:.2}", file.grid.polar_step);
    step_tokens[format.azimuth_step_field] = format!("{:.2}", file.grid.azimuth_step);
    preamble[format.step_line] = step_tokens.join("  ");

    let mut out = preamble.join("\n");
    out.push('\n');

    for block in &file.blocks {
        out.push_str(&format.block_header(block.plane, block.intensities, &file.grid));
        out.push('\n');
        for ring in &block.rings {
            let per_line = ring.len().div_ceil(format.lines_per_ring.max(1)).max(1);
            let mut chunks = ring.chunks(per_line);
            for _ in 0..format.lines_per_ring {
                let line: Vec<String> = chunks
                    .next()
                    .unwrap_or(&[])
                    .iter()
                    .map(|v| format!("{v:9.3}"))
                    .collect();
                out.push_str(&line.join(" "));
                out.push('\n');
            }
        }
    }
    out
}

/// A deterministic RES file with `n_pole_figures` blocks per intensity
/// table, shaped like a weak rolling texture.
pub fn synthetic_res(
    format: &ResFormat,
    grid: AngularGrid,
    n_pole_figures: usize,
    corrected: bool,
) -> ResFile {
    let mut variants = vec![Intensities::Uncorrected];
    if corrected {
        variants.push(Intensities::Corrected);
    }

    let mut blocks = Vec::new();
    for intensities in variants {
        for (p, &plane) in format.planes.iter().take(n_pole_figures).enumerate() {
            let rings = (0..grid.rings(format.polar_max(intensities)))
                .map(|i| {
                    let polar = (i as f64 * grid.polar_step).to_radians();
                    (0..grid.azimuths())
                        .map(|k| {
                            let azimuth = (k as f64 * grid.azimuth_step).to_radians();
                            let v = 1.0
                                + 0.4 * (2.0 * azimuth).cos() * polar.sin()
                                + 0.1 * p as f64
                                + 0.25 * (4.0 * polar).cos();
                            (v * 1000.0).round() / 1000.0
                        })
                        .collect()
                })
                .collect();
            blocks.push(ResBlock {
                plane,
                intensities,
                rings,
            });
        }
    }

    ResFile { grid, blocks }
}
