mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Context, Result};
use app::ViewerApp;
use clap::{Parser, Subcommand, ValueEnum};
use eframe::egui;
use log::info;

use texeval2mtex::analysis::{Analysis, AnalysisConfig, MatlabRunner};
use texeval2mtex::res::{split_res_file, ResFormat};

#[derive(Parser)]
#[command(name = "texeval2mtex")]
#[command(about = "Convert TexEval RES pole figures and drive the MTEX texture analysis", version)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a RES file into one data file per pole figure
    Convert {
        /// TexEval RES file
        input: PathBuf,
        /// Number of pole figures in the file
        n_pole_figures: usize,
        /// JSON description of a non-default RES layout
        #[arg(long)]
        format: Option<PathBuf>,
    },

    /// Check the converted data files and write the MTEX analysis script
    Analyze {
        /// The RES file the data files were converted from
        input: PathBuf,
        /// JSON recipe overriding the default analysis
        #[arg(short, long)]
        recipe: Option<PathBuf>,
        /// Output directory for the script, plots and CSV files
        #[arg(short, long, default_value = "mtex_analysis")]
        out: PathBuf,
        /// Run the script in MATLAB and report the results
        #[arg(long)]
        run: bool,
        /// MATLAB executable
        #[arg(long, default_value = "matlab")]
        matlab: PathBuf,
        /// MTEX installation to add to the MATLAB path
        #[arg(long)]
        mtex: Option<PathBuf>,
    },

    /// Plot converted pole figures and fibre CSVs
    View {
        /// Files to open right away (.dat, .csv)
        files: Vec<PathBuf>,
    },

    /// Print a default configuration as JSON
    Defaults {
        #[arg(value_enum)]
        what: DefaultsKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DefaultsKind {
    /// Analysis recipe
    Recipe,
    /// RES layout descriptor
    Format,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Convert {
            input,
            n_pole_figures,
            format,
        } => {
            let format = match format {
                Some(path) => ResFormat::from_file(&path)?,
                None => ResFormat::default(),
            };
            let summary = split_res_file(&input, n_pole_figures, &format)
                .with_context(|| format!("converting {}", input.display()))?;
            for path in &summary.outputs {
                println!("{}", path.display());
            }
            info!(
                "Wrote {} files ({} rows uncorrected{})",
                summary.outputs.len(),
                summary.uncorrected_rows,
                summary
                    .corrected_rows
                    .map(|n| format!(", {n} rows corrected"))
                    .unwrap_or_default()
            );
        }

        Commands::Analyze {
            input,
            recipe,
            out,
            run,
            matlab,
            mtex,
        } => {
            let mut config = match recipe {
                Some(path) => AnalysisConfig::from_file(&path)?,
                None => AnalysisConfig::default(),
            };
            if mtex.is_some() {
                config.mtex_path = mtex;
            }

            let analysis = Analysis::prepare(&input, config)
                .with_context(|| format!("preparing the analysis of {}", input.display()))?;
            if run {
                let report = analysis.run(&out, &MatlabRunner::new(matlab))?;
                report.log_summary();
            } else {
                let script = analysis.write_script(&out)?;
                println!("{}", script.display());
            }
        }

        Commands::View { files } => run_viewer(files)?,

        Commands::Defaults { what } => {
            let json = match what {
                DefaultsKind::Recipe => serde_json::to_string_pretty(&AnalysisConfig::default())?,
                DefaultsKind::Format => serde_json::to_string_pretty(&ResFormat::default())?,
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn run_viewer(files: Vec<PathBuf>) -> Result<()> {
    let mut app = ViewerApp::default();
    if !files.is_empty() {
        app.state.load_paths(&files);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "texeval2mtex – Pole Figure Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
