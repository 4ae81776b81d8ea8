use std::path::Path;

use super::error::{ResError, Result};
use super::format::{AngularGrid, Intensities, ResFormat};
use crate::data::model::{MeasurementRecord, MillerIndex, PoleFigure};

/// Intensities of one pole figure as stored in the RES file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResBlock {
    pub plane: MillerIndex,
    pub intensities: Intensities,
    /// `rings[i][k]` is the intensity at polar ring `i`, azimuth index `k`.
    pub rings: Vec<Vec<f64>>,
}

impl ResBlock {
    /// Number of measurement rows this block expands to.
    pub fn row_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Expand to measurement records, ring by ring.
    pub fn to_pole_figure(&self, grid: &AngularGrid) -> PoleFigure {
        let records = self
            .rings
            .iter()
            .enumerate()
            .flat_map(|(i, ring)| {
                ring.iter().enumerate().map(move |(k, &intensity)| MeasurementRecord {
                    polar: i as f64 * grid.polar_step,
                    azimuth: k as f64 * grid.azimuth_step,
                    intensity,
                })
            })
            .collect();
        PoleFigure::new(self.plane, records)
    }
}

/// A parsed RES export.
#[derive(Debug, Clone, PartialEq)]
pub struct ResFile {
    pub grid: AngularGrid,
    /// Uncorrected blocks in plane order, followed by the corrected blocks
    /// when the file carries them.
    pub blocks: Vec<ResBlock>,
}

impl ResFile {
    pub fn has_corrected(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| b.intensities == Intensities::Corrected)
    }

    pub fn blocks_of(&self, intensities: Intensities) -> impl Iterator<Item = &ResBlock> {
        self.blocks
            .iter()
            .filter(move |b| b.intensities == intensities)
    }

    /// Total measurement rows over all blocks.
    pub fn row_count(&self) -> usize {
        self.blocks.iter().map(ResBlock::row_count).sum()
    }
}

/// Check the extension and read `path`, then [`parse_res`] it.
pub fn read_res(path: &Path, n_pole_figures: usize, format: &ResFormat) -> Result<ResFile> {
    let is_res = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "RES" || e == "res");
    if !is_res {
        return Err(ResError::UnsupportedExtension(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_res(&content, n_pole_figures, format)
}

/// Parse RES text holding `n_pole_figures` blocks per intensity table.
///
/// The whole file is validated before anything is returned: the block count
/// must match `n_pole_figures` exactly and every ring must fill the grid.
pub fn parse_res(content: &str, n_pole_figures: usize, format: &ResFormat) -> Result<ResFile> {
    if n_pole_figures == 0 {
        return Err(ResError::NoPoleFigures);
    }
    if n_pole_figures > format.planes.len() {
        return Err(ResError::TooManyPoleFigures {
            declared: n_pole_figures,
            supported: format.planes.len(),
        });
    }

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < format.preamble_lines() {
        return Err(ResError::TooShort {
            lines: lines.len(),
            needed: format.preamble_lines(),
        });
    }

    let corrected = lines[format.correction_marker_line]
        .split_whitespace()
        .next()
        .is_some_and(|tok| tok.starts_with(&format.correction_marker));

    let grid = AngularGrid {
        polar_step: step_field(&lines, format.step_line, format.polar_step_field, "polar step")?,
        azimuth_step: step_field(&lines, format.step_line, format.azimuth_step_field, "azimuthal step")?,
    };
    log::debug!(
        "RES grid: polar step {}°, azimuthal step {}°, corrected intensities: {corrected}",
        grid.polar_step,
        grid.azimuth_step
    );

    let mut variants = vec![Intensities::Uncorrected];
    if corrected {
        variants.push(Intensities::Corrected);
    }
    check_grid(&lines, format, &variants, &grid)?;

    let mut blocks = Vec::with_capacity(variants.len() * n_pole_figures);
    for intensities in variants {
        let headers = locate_headers(&lines, format, intensities, &grid);

        let found = headers.iter().filter(|h| h.is_some()).count();
        if found != n_pole_figures {
            return Err(ResError::BlockCountMismatch {
                intensities,
                declared: n_pole_figures,
                found,
            });
        }

        for (&plane, &header) in format.planes.iter().zip(&headers).take(n_pole_figures) {
            let start = header.ok_or(ResError::MissingBlock { plane, intensities })? + 1;
            let rings = read_rings(&lines, start, plane, intensities, format, &grid)?;
            blocks.push(ResBlock {
                plane,
                intensities,
                rings,
            });
        }
    }

    Ok(ResFile { grid, blocks })
}

fn step_field(lines: &[&str], line: usize, field: usize, what: &'static str) -> Result<f64> {
    let text = lines[line];
    text.split_whitespace()
        .nth(field)
        .and_then(|tok| tok.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| ResError::InvalidStep {
            line,
            what,
            text: text.to_string(),
        })
}

/// Reject steps whose ring or azimuth counts cannot possibly fit in the
/// file, before any per-ring buffers are sized from them.
fn check_grid(lines: &[&str], format: &ResFormat, variants: &[Intensities], grid: &AngularGrid) -> Result<()> {
    let invalid = |what| ResError::InvalidStep {
        line: format.step_line,
        what,
        text: lines[format.step_line].to_string(),
    };

    let tokens: usize = lines.iter().map(|l| l.split_whitespace().count()).sum();
    let azimuths = grid.azimuths();
    if azimuths == 0 || azimuths > tokens {
        return Err(invalid("azimuthal step"));
    }

    for &intensities in variants {
        let rings = grid.rings(format.polar_max(intensities));
        let needed = rings.checked_mul(format.lines_per_ring);
        if rings == 0 || needed.map_or(true, |n| n > lines.len()) {
            return Err(invalid("polar step"));
        }
    }
    Ok(())
}

/// Line index of every plane's block header, `None` where absent.  When a
/// header repeats, the last occurrence wins.
fn locate_headers(
    lines: &[&str],
    format: &ResFormat,
    intensities: Intensities,
    grid: &AngularGrid,
) -> Vec<Option<usize>> {
    format
        .planes
        .iter()
        .map(|&plane| {
            let header = format.block_header(plane, intensities, grid);
            lines.iter().rposition(|line| line.trim_end() == header)
        })
        .collect()
}

fn read_rings(
    lines: &[&str],
    start: usize,
    plane: MillerIndex,
    intensities: Intensities,
    format: &ResFormat,
    grid: &AngularGrid,
) -> Result<Vec<Vec<f64>>> {
    let n_rings = grid.rings(format.polar_max(intensities));
    let n_azimuths = grid.azimuths();

    (0..n_rings)
        .map(|ring| {
            let first = start + ring * format.lines_per_ring;
            let last = first + format.lines_per_ring;
            if last > lines.len() {
                return Err(ResError::Truncated {
                    plane,
                    intensities,
                    ring,
                });
            }

            let mut values = Vec::new();
            for (offset, line) in lines[first..last].iter().enumerate() {
                for token in line.split_whitespace() {
                    let v: f64 = token.parse().map_err(|_| ResError::InvalidIntensity {
                        line: first + offset,
                        token: token.to_string(),
                    })?;
                    values.push((v * 1000.0).round() / 1000.0);
                }
            }

            if values.len() != n_azimuths {
                return Err(ResError::RingSize {
                    plane,
                    intensities,
                    ring,
                    expected: n_azimuths,
                    found: values.len(),
                });
            }
            Ok(values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::res::render::{render_res, synthetic_res};

    fn small_format() -> ResFormat {
        ResFormat {
            uncorrected_polar_max: 20.0,
            corrected_polar_max: 30.0,
            lines_per_ring: 2,
            ..ResFormat::default()
        }
    }

    fn grid() -> AngularGrid {
        AngularGrid { polar_step: 10.0, azimuth_step: 45.0 }
    }

    #[test]
    fn test_parse_uncorrected_only() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 4, false), &format, "test");
        let parsed = parse_res(&text, 4, &format).unwrap();

        assert!(!parsed.has_corrected());
        assert_eq!(parsed.blocks.len(), 4);
        let planes: Vec<String> = parsed.blocks.iter().map(|b| b.plane.to_string()).collect();
        assert_eq!(planes, vec!["111", "200", "220", "311"]);
        for block in &parsed.blocks {
            assert_eq!(block.rings.len(), 2);
            assert_eq!(block.row_count(), 16);
        }
        assert_eq!(parsed.row_count(), 64);
    }

    #[test]
    fn test_parse_with_corrected() {
        let format = small_format();
        let source = synthetic_res(&format, grid(), 3, true);
        let text = render_res(&source, &format, "test");
        let parsed = parse_res(&text, 3, &format).unwrap();

        assert!(parsed.has_corrected());
        assert_eq!(parsed.blocks_of(Intensities::Uncorrected).count(), 3);
        let corrected: Vec<_> = parsed.blocks_of(Intensities::Corrected).collect();
        assert_eq!(corrected.len(), 3);
        assert_eq!(corrected[0].rings.len(), 3);
        assert_eq!(parsed, source);
    }

    #[test]
    fn test_declared_count_must_match() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 4, false), &format, "test");

        let err = parse_res(&text, 3, &format).unwrap_err();
        assert!(matches!(err, ResError::BlockCountMismatch { declared: 3, found: 4, .. }));

        let err = parse_res(&text, 5, &format).unwrap_err();
        assert!(matches!(err, ResError::BlockCountMismatch { declared: 5, found: 4, .. }));
    }

    #[test]
    fn test_count_bounds() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 1, false), &format, "test");
        assert!(matches!(parse_res(&text, 0, &format), Err(ResError::NoPoleFigures)));
        assert!(matches!(
            parse_res(&text, 7, &format),
            Err(ResError::TooManyPoleFigures { declared: 7, supported: 6 })
        ));
    }

    #[test]
    fn test_missing_leading_block() {
        let format = small_format();
        let mut source = synthetic_res(&format, grid(), 2, false);
        // Keep two blocks, but for planes 200 and 220 instead of 111 and 200.
        source.blocks[0].plane = MillerIndex::new(2, 2, 0);
        let text = render_res(&source, &format, "test");
        let err = parse_res(&text, 2, &format).unwrap_err();
        assert!(matches!(err, ResError::MissingBlock { .. }), "{err}");
    }

    #[test]
    fn test_short_ring_is_rejected() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 1, false), &format, "test");
        // Drop the last intensity of the first ring.
        let header = format.block_header(MillerIndex::new(1, 1, 1), Intensities::Uncorrected, &grid());
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        let at = lines.iter().position(|l| l.trim_end() == header).unwrap() + 2;
        let mut tokens: Vec<&str> = lines[at].split_whitespace().collect();
        tokens.pop();
        lines[at] = tokens.join(" ");

        let err = parse_res(&lines.join("\n"), 1, &format).unwrap_err();
        assert!(
            matches!(err, ResError::RingSize { ring: 0, expected: 8, found: 7, .. }),
            "{err}"
        );
    }

    #[test]
    fn test_truncated_block() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 1, false), &format, "test");
        let lines: Vec<&str> = text.lines().collect();
        let cut = lines[..lines.len() - 1].join("\n");
        let err = parse_res(&cut, 1, &format).unwrap_err();
        assert!(matches!(err, ResError::Truncated { ring: 1, .. }), "{err}");
    }

    #[test]
    fn test_bad_step_line() {
        let format = small_format();
        let text = "title\ninfo\nNOCORR\nSTEP x 5.0\n";
        assert!(matches!(
            parse_res(text, 1, &format),
            Err(ResError::InvalidStep { line: 3, .. })
        ));
        assert!(matches!(
            parse_res("a\nb\n", 1, &format),
            Err(ResError::TooShort { lines: 2, needed: 4 })
        ));
    }

    #[test]
    fn test_step_too_fine_for_file() {
        let format = ResFormat::default();
        let grid = AngularGrid { polar_step: 5.0, azimuth_step: 0.000000001 };
        let header = format.block_header(MillerIndex::new(1, 1, 1), Intensities::Uncorrected, &grid);
        let mut text = format!("t\n*\nNOCORR\nSTEP 5.00 0.000000001\n{header}\n");
        for _ in 0..8 {
            text.push_str("1\n");
        }
        let err = parse_res(&text, 1, &format).unwrap_err();
        assert!(
            matches!(err, ResError::InvalidStep { line: 3, what: "azimuthal step", .. }),
            "{err}"
        );

        // A polar step asking for more rings than the file has lines.
        let text = "t\n*\nNOCORR\nSTEP 0.0001 180.00\n1\n";
        let err = parse_res(text, 1, &format).unwrap_err();
        assert!(matches!(err, ResError::InvalidStep { what: "polar step", .. }), "{err}");
    }

    #[test]
    fn test_non_numeric_intensity() {
        let format = small_format();
        let text = render_res(&synthetic_res(&format, grid(), 1, false), &format, "test");
        let header = format.block_header(MillerIndex::new(1, 1, 1), Intensities::Uncorrected, &grid());
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        let at = lines.iter().position(|l| l.trim_end() == header).unwrap() + 1;
        lines[at] = lines[at].replacen(char::is_numeric, "x", 1);

        let err = parse_res(&lines.join("\n"), 1, &format).unwrap_err();
        match err {
            ResError::InvalidIntensity { line, token } => {
                assert_eq!(line, at);
                assert!(token.contains('x'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_intensities_round_to_three_decimals() {
        let format = small_format();
        let mut source = synthetic_res(&format, grid(), 1, false);
        source.blocks[0].rings[0][0] = 1.23456;
        let text = render_res(&source, &format, "test");
        let parsed = parse_res(&text, 1, &format).unwrap();
        assert_eq!(parsed.blocks[0].rings[0][0], 1.235);
    }

    #[test]
    fn test_to_pole_figure_grid() {
        let block = ResBlock {
            plane: MillerIndex::new(1, 1, 1),
            intensities: Intensities::Uncorrected,
            rings: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        };
        let pf = block.to_pole_figure(&AngularGrid { polar_step: 5.0, azimuth_step: 180.0 });
        let grid: Vec<_> = pf.grid().collect();
        assert_eq!(grid, vec![(0.0, 0.0), (0.0, 180.0), (5.0, 0.0), (5.0, 180.0)]);
        assert_eq!(pf.records[3].intensity, 4.0);
    }

    #[test]
    fn test_extension_check() {
        let err = read_res(Path::new("measurement.txt"), 4, &ResFormat::default()).unwrap_err();
        assert!(matches!(err, ResError::UnsupportedExtension(_)));
    }
}
