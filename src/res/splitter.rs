use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{ResError, Result};
use super::format::{Intensities, ResFormat};
use super::parser::{read_res, ResBlock};
use crate::data::model::{MillerIndex, PoleFigure};

/// What a split run produced.
#[derive(Debug, Clone)]
pub struct SplitSummary {
    /// Written files: uncorrected in plane order, then corrected.
    pub outputs: Vec<PathBuf>,
    /// Rows written to each uncorrected file.
    pub uncorrected_rows: usize,
    /// Rows written to each corrected file, if the RES file had them.
    pub corrected_rows: Option<usize>,
}

/// Data file for `plane` next to `input`: `<stem>_pf<plane>_<corr|uncorr>.dat`.
pub fn output_path(input: &Path, plane: MillerIndex, intensities: Intensities) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_pf{plane}_{}.dat", intensities.suffix()))
}

/// Write one pole figure as `polar azimuth intensity` lines.  Angles are
/// truncated to whole degrees, intensities printed with three decimals.
pub fn write_pole_figure(path: &Path, pole_figure: &PoleFigure) -> Result<()> {
    let write_err = |source| ResError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    for r in &pole_figure.records {
        writeln!(
            writer,
            "{} {} {:.3}",
            r.polar.trunc() as i64,
            r.azimuth.trunc() as i64,
            r.intensity
        )
        .map_err(write_err)?;
    }
    writer.flush().map_err(write_err)
}

/// Split a RES file into one data file per pole figure and intensity table.
///
/// The input is parsed and validated completely before the first file is
/// created, so malformed input leaves no outputs behind.
pub fn split_res_file(input: &Path, n_pole_figures: usize, format: &ResFormat) -> Result<SplitSummary> {
    let res = read_res(input, n_pole_figures, format)?;
    log::info!(
        "Read {} blocks ({} rows) from {}",
        res.blocks.len(),
        res.row_count(),
        input.display()
    );

    let mut outputs = Vec::with_capacity(res.blocks.len());
    for block in &res.blocks {
        let path = output_path(input, block.plane, block.intensities);
        write_pole_figure(&path, &block.to_pole_figure(&res.grid))?;
        log::debug!("Wrote {} rows to {}", block.row_count(), path.display());
        outputs.push(path);
    }

    let rows_of = |intensities| res.blocks_of(intensities).next().map(ResBlock::row_count);

    Ok(SplitSummary {
        outputs,
        uncorrected_rows: rows_of(Intensities::Uncorrected).unwrap_or(0),
        corrected_rows: rows_of(Intensities::Corrected),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::assemble;
    use crate::data::model::{CrystalSymmetry, SpecimenSymmetry};
    use crate::res::format::AngularGrid;
    use crate::res::render::{render_res, synthetic_res};
    use tempfile::TempDir;

    fn write_res(dir: &Path, name: &str, n: usize, corrected: bool, grid: AngularGrid) -> PathBuf {
        let format = ResFormat::default();
        let path = dir.join(name);
        let text = render_res(&synthetic_res(&format, grid, n, corrected), &format, "synthetic");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn count_lines(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    fn dat_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "dat"))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_output_path() {
        let p = output_path(Path::new("/data/Al_sheet.RES"), MillerIndex::new(2, 2, 0), Intensities::Corrected);
        assert_eq!(p, PathBuf::from("/data/Al_sheet_pf220_corr.dat"));
    }

    #[test]
    fn test_four_blocks_of_1000_rows() {
        // 4° x 9° over 100° of polar coverage gives 25 x 40 = 1000 rows.
        let dir = TempDir::new().unwrap();
        let format = ResFormat {
            uncorrected_polar_max: 100.0,
            ..ResFormat::default()
        };
        let grid = AngularGrid { polar_step: 4.0, azimuth_step: 9.0 };
        let input = dir.path().join("Al_rolled.RES");
        let text = render_res(&synthetic_res(&format, grid, 4, false), &format, "synthetic");
        std::fs::write(&input, &text).unwrap();

        let summary = split_res_file(&input, 4, &format).unwrap();
        assert_eq!(summary.outputs.len(), 4);
        assert_eq!(summary.uncorrected_rows, 1000);
        assert_eq!(summary.corrected_rows, None);
        for out in &summary.outputs {
            assert_eq!(count_lines(out), 1000);
        }

        // The converted files assemble into a 4-entry set in input order.
        let millers: Vec<MillerIndex> = format.planes[..4].to_vec();
        let set = assemble(
            &summary.outputs,
            &millers,
            CrystalSymmetry::default(),
            SpecimenSymmetry::Triclinic,
        )
        .unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.millers(), millers);
        assert_eq!(set.rows_per_pole_figure(), 1000);
    }

    #[test]
    fn test_total_rows_match_input_values() {
        let dir = TempDir::new().unwrap();
        let grid = AngularGrid { polar_step: 5.0, azimuth_step: 5.0 };
        let input = write_res(dir.path(), "a.res", 4, true, grid);
        let summary = split_res_file(&input, 4, &ResFormat::default()).unwrap();

        assert_eq!(summary.outputs.len(), 8);
        assert_eq!(summary.uncorrected_rows, 16 * 72);
        assert_eq!(summary.corrected_rows, Some(18 * 72));

        // Every intensity token after the preamble and the block headers
        // ends up as exactly one output row.
        let text = std::fs::read_to_string(&input).unwrap();
        let format = ResFormat::default();
        let header_lines = 8;
        let value_tokens: usize = text
            .lines()
            .skip(format.preamble_lines())
            .map(|l| l.split_whitespace().count())
            .sum::<usize>()
            - header_lines * 7;
        let written: usize = summary.outputs.iter().map(|p| count_lines(p)).sum();
        assert_eq!(written, value_tokens);
    }

    #[test]
    fn test_output_row_format() {
        let dir = TempDir::new().unwrap();
        let grid = AngularGrid { polar_step: 2.5, azimuth_step: 5.0 };
        let input = write_res(dir.path(), "fine.RES", 1, false, grid);
        let summary = split_res_file(&input, 1, &ResFormat::default()).unwrap();

        let text = std::fs::read_to_string(&summary.outputs[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 32 * 72);
        // Ring 1 sits at 2.5°, printed truncated.
        let fields: Vec<&str> = lines[72 + 1].split(' ').collect();
        assert_eq!(fields[0], "2");
        assert_eq!(fields[1], "5");
        assert_eq!(fields[2].split('.').nth(1).map(str::len), Some(3));
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let grid = AngularGrid { polar_step: 5.0, azimuth_step: 5.0 };
        let input = write_res(dir.path(), "b.RES", 3, true, grid);

        let err = split_res_file(&input, 4, &ResFormat::default()).unwrap_err();
        assert!(matches!(err, ResError::BlockCountMismatch { declared: 4, found: 3, .. }));
        assert!(dat_files(dir.path()).is_empty());
    }

    #[test]
    fn test_rejects_other_extensions() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("c.txt");
        std::fs::write(&input, "x").unwrap();
        assert!(matches!(
            split_res_file(&input, 1, &ResFormat::default()),
            Err(ResError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_bad_corrected_table_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let grid = AngularGrid { polar_step: 5.0, azimuth_step: 5.0 };
        let input = write_res(dir.path(), "d.RES", 4, true, grid);

        // The last corrected block loses its final line; the uncorrected
        // table stays intact.
        let text = std::fs::read_to_string(&input).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        std::fs::write(&input, lines[..lines.len() - 1].join("\n")).unwrap();

        let err = split_res_file(&input, 4, &ResFormat::default()).unwrap_err();
        assert!(
            matches!(err, ResError::Truncated { intensities: Intensities::Corrected, .. }),
            "{err}"
        );
        assert!(dat_files(dir.path()).is_empty());
    }
}
