//! Rendering a [`Plan`] as a MATLAB script for MTEX.
//!
//! The renderer tracks which specimen symmetry the pole-figure set and the
//! ODF currently carry in the script and emits an `SS` assignment only where
//! the next step needs a different one.

use std::path::{Path, PathBuf};

use super::error::{AnalysisError, Result};
use super::plan::{volume_key, Plan, PlotKind, Property, Step};
use crate::data::loader::DAT_COLUMNS;
use crate::data::model::{CrystalSymmetry, MillerIndex, SpecimenSymmetry};
use crate::texture::fibre::FIBRE_CSV_HEADER;
use crate::texture::orientation::OrientationSpec;

/// Name of the generated script.
pub const SCRIPT_FILE: &str = "texture_analysis.m";

/// Quote `s` as a MATLAB char array.
pub fn matlab_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn matlab_vec(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("[{}]", items.join(" "))
}

fn matlab_ints(values: &[usize]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(" "))
}

fn miller_vec(m: &MillerIndex) -> String {
    format!("[{} {} {}]", m.h, m.k, m.l)
}

fn symmetry_var(ss: SpecimenSymmetry) -> &'static str {
    match ss {
        SpecimenSymmetry::Triclinic => "ss_triclinic",
        SpecimenSymmetry::Orthorhombic => "ss_orthorhombic",
    }
}

/// MATLAB identifier for a named thing.
fn ident(prefix: &str, name: &str) -> String {
    let body: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{prefix}_{body}")
}

fn crystal_symmetry(cs: &CrystalSymmetry) -> String {
    format!(
        "cs = crystalSymmetry({}, {}, {}*degree, 'mineral', {});",
        matlab_str(&cs.point_group),
        matlab_vec(&cs.lattice),
        matlab_vec(&cs.angles),
        matlab_str(&cs.mineral)
    )
}

fn orientation(spec: &OrientationSpec, ss: SpecimenSymmetry) -> String {
    match spec {
        OrientationSpec::Euler(e) => format!(
            "orientation.byEuler({}*degree, {}*degree, {}*degree, cs, {})",
            e.phi1,
            e.big_phi,
            e.phi2,
            symmetry_var(ss)
        ),
        OrientationSpec::Miller { plane, direction } => format!(
            "orientation.byMiller({}, {}, cs, {})",
            miller_vec(plane),
            miller_vec(direction),
            symmetry_var(ss)
        ),
    }
}

/// Which script object a symmetry applies to.
#[derive(Debug, Clone, Copy)]
enum Subject {
    PoleFigures,
    Odf,
}

struct ScriptWriter {
    out: String,
    pfs_symmetry: Option<SpecimenSymmetry>,
    odf_symmetry: Option<SpecimenSymmetry>,
}

impl ScriptWriter {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn require(&mut self, subject: Subject, ss: SpecimenSymmetry) {
        let (current, var) = match subject {
            Subject::PoleFigures => (&mut self.pfs_symmetry, "pfs"),
            Subject::Odf => (&mut self.odf_symmetry, "odf"),
        };
        if *current != Some(ss) {
            *current = Some(ss);
            let text = format!("{var}.SS = {};", symmetry_var(ss));
            self.line(&text);
        }
    }

    fn save_figure(&mut self, file: &str) {
        let text = format!("saveFigure(fullfile(outdir, {}));", matlab_str(file));
        self.line(&text);
        self.line("close(gcf);");
    }

    fn step(&mut self, step: &Step) {
        match step {
            Step::LoadPoleFigures {
                files,
                millers,
                crystal_symmetry: cs,
                symmetry,
            } => {
                self.line("% Pole figures");
                self.line(&crystal_symmetry(cs));
                let names: Vec<String> = files
                    .iter()
                    .map(|f| matlab_str(&f.display().to_string()))
                    .collect();
                self.line(&format!("fnames = {{{}}};", names.join(", ")));
                let hs: Vec<String> = millers
                    .iter()
                    .map(|m| format!("Miller({}, {}, {}, cs)", m.h, m.k, m.l))
                    .collect();
                self.line(&format!("h = {{{}}};", hs.join(", ")));
                let columns: Vec<String> = DAT_COLUMNS.iter().map(|c| matlab_str(c)).collect();
                self.line(&format!(
                    "pfs = PoleFigure.load(fnames, h, cs, {}, 'interface', 'generic', 'ColumnNames', {{{}}});",
                    symmetry_var(*symmetry),
                    columns.join(", ")
                ));
                self.pfs_symmetry = Some(*symmetry);
            }

            Step::Plot {
                kind,
                symmetry,
                file,
            } => {
                let subject = match kind {
                    PlotKind::RawPoleFigures => Subject::PoleFigures,
                    _ => Subject::Odf,
                };
                self.require(subject, *symmetry);
                self.line("figure;");
                match kind {
                    PlotKind::RawPoleFigures => self.line("plot(pfs, 'contourf');"),
                    PlotKind::RecalculatedPoleFigures { levels } => self.line(&format!(
                        "plotPDF(odf, pfs.h, 'contourf', {});",
                        matlab_vec(levels)
                    )),
                    PlotKind::OdfPhi2Sections { angles, levels } => self.line(&format!(
                        "plot(odf, 'phi2', {}*degree, 'contourf', {});",
                        matlab_vec(angles),
                        matlab_vec(levels)
                    )),
                    PlotKind::OdfSections { count } => {
                        self.line(&format!("plot(odf, 'sections', {count});"))
                    }
                    PlotKind::InversePoleFigure => self.line("plotIPDF(odf, vector3d.Z);"),
                }
                self.line("mtexColorbar;");
                self.save_figure(file);
            }

            Step::FitOdf => {
                self.blank();
                self.line("% ODF");
                self.line("odf = calcODF(pfs);");
                self.odf_symmetry = self.pfs_symmetry;
            }

            Step::Property { property, symmetry } => {
                self.require(Subject::Odf, *symmetry);
                let expr = match property {
                    Property::TextureIndex => "textureindex(odf)",
                    Property::Entropy => "entropy(odf)",
                    Property::MaxDensity => "max(odf)",
                };
                self.record_property(property.key(), expr);
            }

            Step::VolumeFraction {
                component,
                spread_deg,
                symmetry,
            } => {
                self.require(Subject::Odf, *symmetry);
                let var = ident("ori", &component.name);
                self.line(&format!(
                    "{var} = {};",
                    orientation(&component.orientation, *symmetry)
                ));
                let expr = format!("volume(odf, {var}, {spread_deg}*degree)");
                self.record_property(&volume_key(&component.name), &expr);
            }

            Step::SampleFibre {
                fibre,
                from,
                to,
                indices,
                symmetry,
            } => {
                self.blank();
                self.line(&format!("% Fibre {} -> {}", fibre.from, fibre.to));
                self.require(Subject::Odf, *symmetry);
                self.line(&format!("ori_start = {};", orientation(from, *symmetry)));
                self.line(&format!("ori_end = {};", orientation(to, *symmetry)));
                self.line("f = fibre(ori_start, ori_end);");
                self.line("ori_f = f.orientation;");
                self.line(&format!("ori_f = ori_f({});", matlab_ints(indices)));
                self.line("v = eval(odf, ori_f);");
                self.line("data = [ori_f.phi1(:) ori_f.Phi(:) ori_f.phi2(:)] / degree;");
                self.line("data = [data v(:)];");
                let csv = format!("{}.csv", fibre.name);
                self.line(&format!("fid = fopen(fullfile(outdir, {}), 'w');", matlab_str(&csv)));
                self.line(&format!(
                    "fprintf(fid, '{}\\n');",
                    FIBRE_CSV_HEADER.join(", ")
                ));
                self.line("fprintf(fid, '%.4f, %.4f, %.4f, %.4f\\n', data.');");
                self.line("fclose(fid);");
                self.line("figure;");
                self.line("plot(1:numel(v), v, '-o');");
                self.line("xlabel('sample'); ylabel('f(g)');");
                self.line(&format!("title({}, 'Interpreter', 'none');", matlab_str(&fibre.name)));
                self.save_figure(&format!("{}.png", fibre.name));
            }

            Step::WriteProperties { file } => {
                self.blank();
                self.line("% Scalar results");
                self.line(&format!("fid = fopen(fullfile(outdir, {}), 'w');", matlab_str(file)));
                self.line("fprintf(fid, 'property, value\\n');");
                self.line("for i = 1:numel(property_names)");
                self.line("    fprintf(fid, '%s, %.6f\\n', property_names{i}, property_values(i));");
                self.line("end");
                self.line("fclose(fid);");
            }
        }
    }

    fn record_property(&mut self, key: &str, expr: &str) {
        self.line(&format!("property_names{{end+1}} = {};", matlab_str(key)));
        self.line(&format!("property_values(end+1) = {expr};"));
    }
}

/// Render `plan` as a standalone MATLAB script writing into `out_dir`.
pub fn render_script(plan: &Plan, out_dir: &Path, mtex_path: Option<&Path>) -> String {
    let mut w = ScriptWriter {
        out: String::new(),
        pfs_symmetry: None,
        odf_symmetry: None,
    };

    w.line(&format!(
        "% Texture analysis generated by texeval2mtex {}",
        env!("CARGO_PKG_VERSION")
    ));
    w.line("close all;");
    if let Some(mtex) = mtex_path {
        w.line(&format!("addpath({});", matlab_str(&mtex.display().to_string())));
        w.line("startup_mtex;");
    }
    w.line(&format!("outdir = {};", matlab_str(&out_dir.display().to_string())));
    w.line("setMTEXpref('xAxisDirection', 'north');");
    w.line("setMTEXpref('zAxisDirection', 'outOfPlane');");
    for ss in [SpecimenSymmetry::Triclinic, SpecimenSymmetry::Orthorhombic] {
        w.line(&format!(
            "{} = specimenSymmetry({});",
            symmetry_var(ss),
            matlab_str(ss.point_group())
        ));
    }
    w.line("property_names = {};");
    w.line("property_values = [];");
    w.blank();

    for step in &plan.steps {
        w.step(step);
    }
    w.out
}

/// Write the rendered script to `out_dir/texture_analysis.m`.
pub fn write_script(plan: &Plan, out_dir: &Path, mtex_path: Option<&Path>) -> Result<PathBuf> {
    let write_err = |path: &Path, source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(out_dir).map_err(|e| write_err(out_dir, e))?;
    let out_dir = std::path::absolute(out_dir).map_err(|e| write_err(out_dir, e))?;
    let path = out_dir.join(SCRIPT_FILE);
    std::fs::write(&path, render_script(plan, &out_dir, mtex_path)).map_err(|e| write_err(&path, e))?;
    log::info!("Wrote MTEX script {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::recipe::AnalysisConfig;

    fn script() -> String {
        let files: Vec<PathBuf> = ["111", "200", "220", "311"]
            .iter()
            .map(|p| PathBuf::from(format!("/data/Al_pf{p}_corr.dat")))
            .collect();
        let plan = Plan::build(&AnalysisConfig::default(), files).unwrap();
        render_script(&plan, Path::new("/tmp/out"), Some(Path::new("/opt/mtex")))
    }

    fn position(script: &str, needle: &str) -> usize {
        script
            .find(needle)
            .unwrap_or_else(|| panic!("'{needle}' missing from script"))
    }

    #[test]
    fn test_quoting() {
        assert_eq!(matlab_str("it's"), "'it''s'");
        assert_eq!(ident("ori", "Cube-ND"), "ori_Cube_ND");
    }

    #[test]
    fn test_preamble_and_loading() {
        let s = script();
        assert!(s.contains("addpath('/opt/mtex');"));
        assert!(s.contains(
            "cs = crystalSymmetry('m-3m', [4.04 4.04 4.04], [90 90 90]*degree, 'mineral', 'Aluminium');"
        ));
        assert!(s.contains("fnames = {'/data/Al_pf111_corr.dat', '/data/Al_pf200_corr.dat', "));
        assert!(s.contains("h = {Miller(1, 1, 1, cs), Miller(2, 0, 0, cs), Miller(2, 2, 0, cs), Miller(3, 1, 1, cs)};"));
        assert!(s.contains("'ColumnNames', {'Polar Angle', 'Azimuth Angle', 'Intensity'}"));
    }

    #[test]
    fn test_symmetry_switches_only_where_needed() {
        let s = script();
        // Properties switch to orthorhombic once, the recalculated pole
        // figures go back to triclinic, the ODF sections switch again.
        assert_eq!(s.matches("odf.SS = ss_orthorhombic;").count(), 2);
        assert_eq!(s.matches("odf.SS = ss_triclinic;").count(), 1);
        assert!(!s.contains("pfs.SS ="));

        let fit = position(&s, "odf = calcODF(pfs);");
        let first_ortho = position(&s, "odf.SS = ss_orthorhombic;");
        let texture_index = position(&s, "textureindex(odf)");
        let back_to_triclinic = position(&s, "odf.SS = ss_triclinic;");
        let pdf = position(&s, "plotPDF(odf, pfs.h, 'contourf', [0.5 1 1.5 2 2.5 3 3.5 4]);");
        assert!(fit < first_ortho && first_ortho < texture_index);
        assert!(texture_index < back_to_triclinic && back_to_triclinic < pdf);
    }

    #[test]
    fn test_volume_fractions() {
        let s = script();
        assert!(s.contains(
            "ori_Brass = orientation.byMiller([0 1 1], [2 1 -1], cs, ss_orthorhombic);"
        ));
        assert!(s.contains(
            "ori_CubeND = orientation.byEuler(22*degree, 0*degree, 0*degree, cs, ss_orthorhombic);"
        ));
        assert!(s.contains("property_values(end+1) = volume(odf, ori_S, 10*degree);"));
        assert_eq!(s.matches("volume(odf, ").count(), 9);
    }

    #[test]
    fn test_fibre_export() {
        let s = script();
        assert!(s.contains("ori_f = ori_f([1 112 223 334 445 556 667 778 889 1000]);"));
        assert!(s.contains("fopen(fullfile(outdir, 'beta_fibre.csv'), 'w');"));
        assert!(s.contains("fopen(fullfile(outdir, 'cube_goss_fibre.csv'), 'w');"));
        assert!(s.contains("fprintf(fid, 'phi1, Phi, phi2, fibreValue\\n');"));
        assert!(s.contains("saveFigure(fullfile(outdir, 'beta_fibre.png'));"));
        assert!(position(&s, "beta_fibre.csv") < position(&s, "'properties.csv'"));
    }

    #[test]
    fn test_plot_sequence() {
        let s = script();
        let order = [
            "plot(pfs, 'contourf');",
            "plotPDF(odf",
            "plot(odf, 'phi2', [0 45 65]*degree, 'contourf', [1 2 3 4 5 6 8 10 12]);",
            "plot(odf, 'sections', 18);",
            "plotIPDF(odf, vector3d.Z);",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&s, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_script_opens_with_version_banner() {
        let s = script();
        let first = s.lines().next().unwrap();
        assert_eq!(
            first,
            format!("% Texture analysis generated by texeval2mtex {}", env!("CARGO_PKG_VERSION"))
        );
        assert_eq!(s.lines().nth(1), Some("close all;"));
    }
}
