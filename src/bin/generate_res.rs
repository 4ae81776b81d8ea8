//! Writes a synthetic TexEval RES file (and optionally demo fibre CSVs) for
//! trying the converter and the viewer without a diffractometer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use texeval2mtex::res::render::{render_res, synthetic_res};
use texeval2mtex::res::{AngularGrid, ResFormat};
use texeval2mtex::texture::fibre::{write_fibre_csv, FibreSample, DEFAULT_SAMPLE_COUNT};
use texeval2mtex::texture::orientation::EulerAngles;

#[derive(Parser, Debug)]
#[command(about = "Generate a synthetic TexEval RES file")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// File stem of the RES file
    #[arg(long, default_value = "synthetic")]
    name: String,

    /// Number of pole figures
    #[arg(short = 'n', long, default_value_t = 4)]
    pole_figures: usize,

    #[arg(long, default_value_t = 5.0)]
    polar_step: f64,

    #[arg(long, default_value_t = 5.0)]
    azimuth_step: f64,

    /// Also write a corrected intensity table
    #[arg(long)]
    corrected: bool,

    /// Standard deviation of the added noise
    #[arg(long, default_value_t = 0.02)]
    noise: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also write beta_fibre.csv and cube_goss_fibre.csv
    #[arg(long)]
    fibres: bool,
}

/// Deterministic PRNG: xoshiro256** output and update, state seeded by an
/// LCG so a single `u64` seed reproduces a file.
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Euler angles linearly interpolated from `from` to `to`, with a bump of
/// intensity in the middle of the path.
fn demo_fibre(from: EulerAngles, to: EulerAngles, peak: f64, rng: &mut SimpleRng) -> Vec<FibreSample> {
    let n = DEFAULT_SAMPLE_COUNT;
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let lerp = |a: f64, b: f64| a + (b - a) * t;
            FibreSample {
                euler: EulerAngles::new(
                    lerp(from.phi1, to.phi1),
                    lerp(from.big_phi, to.big_phi),
                    lerp(from.phi2, to.phi2),
                ),
                value: (1.0 + peak * (-(t - 0.5).powi(2) / 0.08).exp() + rng.gauss(0.0, 0.05)).max(0.0),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let format = ResFormat::default();
    let grid = AngularGrid {
        polar_step: args.polar_step,
        azimuth_step: args.azimuth_step,
    };
    let mut rng = SimpleRng::new(args.seed);

    let mut res = synthetic_res(&format, grid, args.pole_figures, args.corrected);
    for block in &mut res.blocks {
        for v in block.rings.iter_mut().flatten() {
            let noisy = (*v + rng.gauss(0.0, args.noise)).max(0.0);
            *v = (noisy * 1000.0).round() / 1000.0;
        }
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let path = args.out.join(format!("{}.RES", args.name));
    std::fs::write(&path, render_res(&res, &format, &args.name))
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Wrote {} pole figures ({} rows each) to {}",
        args.pole_figures,
        res.blocks.first().map_or(0, |b| b.row_count()),
        path.display()
    );

    if args.fibres {
        let fibres = [
            (
                "beta_fibre",
                EulerAngles::new(90.0, 35.0, 45.0),
                EulerAngles::new(35.0, 45.0, 0.0),
                3.0,
            ),
            (
                "cube_goss_fibre",
                EulerAngles::new(0.0, 0.0, 0.0),
                EulerAngles::new(0.0, 45.0, 0.0),
                1.5,
            ),
        ];
        for (name, from, to, peak) in fibres {
            let path = args.out.join(format!("{name}.csv"));
            write_fibre_csv(&path, &demo_fibre(from, to, peak, &mut rng))?;
            log::info!("Wrote {}", path.display());
        }
    }
    Ok(())
}
