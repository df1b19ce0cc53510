use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;

use commit_viewer::MicrostructureModel;
use commit_viewer::config::CylinderConfig;
use commit_viewer::data::loader::{DICTIONARY_TRK, coefficients_dir, results_dir};
use commit_viewer::data::model::Streamline;
use commit_viewer::data::{npy, trk};

/// Write a synthetic COMMIT output directory for trying out the viewer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to create
    #[arg(default_value = "sample_commit_output")]
    output: PathBuf,

    /// Number of fibres in the dictionary
    #[arg(long, default_value = "2000")]
    fibers: usize,

    /// Number of solver iterations to dump
    #[arg(long, default_value = "30")]
    iterations: usize,

    /// Only write the Stick model output
    #[arg(long)]
    stick_only: bool,
}

/// Minimal deterministic PRNG (xoshiro256**)
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

/// Arc-shaped fibre through a jittered seed, bending around one of three
/// bundle axes.
fn generate_streamline(rng: &mut SimpleRng) -> Streamline {
    let bundle = (rng.next_u64() % 3) as usize;
    let seed = Vec3::new(
        rng.gauss(0.0, 6.0) as f32,
        rng.gauss(0.0, 6.0) as f32,
        rng.gauss(0.0, 6.0) as f32,
    );
    let (axis, bend) = match bundle {
        0 => (Vec3::X, Vec3::Z),
        1 => (Vec3::Y, Vec3::X),
        _ => (Vec3::Z, Vec3::Y),
    };
    let n_points = 40;
    let points = (0..n_points)
        .map(|i| {
            let s = i as f32 / (n_points - 1) as f32 * 2.0 - 1.0;
            seed + axis * (s * 60.0) + bend * (20.0 * (1.0 - s * s))
        })
        .collect();
    Streamline::new(points)
}

/// Coefficient of a fibre at `iteration`, relaxing from a flat start towards
/// `target` with shrinking noise.
fn relax(target: f64, iteration: usize, rng: &mut SimpleRng) -> f64 {
    let decay = (-(iteration as f64) / 6.0).exp();
    let value = target + (0.5 - target) * decay + rng.gauss(0.0, 0.02 * decay);
    value.max(0.0)
}

fn write_stick(dir: &Path, targets: &[f64], iterations: usize, rng: &mut SimpleRng) -> Result<()> {
    let model = MicrostructureModel::Stick;
    std::fs::create_dir_all(results_dir(dir, model))?;
    let coeff_dir = coefficients_dir(dir, model);
    std::fs::create_dir_all(&coeff_dir)?;

    for it in 0..iterations {
        let mut x: Vec<f64> = targets.iter().map(|&t| relax(t, it, rng)).collect();
        // extra-cellular and isotropic compartments follow the IC block
        x.extend((0..16).map(|_| rng.next_f64()));
        npy::write_f64(&coeff_dir.join(format!("{it}.npy")), &x)?;
    }
    Ok(())
}

fn write_cylinder(
    dir: &Path,
    preferred_atom: &[usize],
    iterations: usize,
    rng: &mut SimpleRng,
) -> Result<()> {
    let model = MicrostructureModel::Cylinder;
    let atoms = CylinderConfig::default().atoms;
    let n_fibers = preferred_atom.len();
    std::fs::create_dir_all(results_dir(dir, model))?;
    let coeff_dir = coefficients_dir(dir, model);
    std::fs::create_dir_all(&coeff_dir)?;

    for it in 0..iterations {
        let mut x = vec![0.0; atoms * n_fibers];
        for (f, &atom) in preferred_atom.iter().enumerate() {
            for a in 0..atoms {
                let target = if a == atom { 1.0 } else { 0.0 };
                x[a * n_fibers + f] = relax(target, it, rng);
            }
        }
        npy::write_f64(&coeff_dir.join(format!("{it}.npy")), &x)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(42);
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let streamlines: Vec<Streamline> = (0..args.fibers)
        .map(|_| generate_streamline(&mut rng))
        .collect();
    trk::write(&args.output.join(DICTIONARY_TRK), &streamlines)?;

    // A third of the fibres converge to ~0 (spurious), the rest spread over (0, 1].
    let targets: Vec<f64> = (0..args.fibers)
        .map(|i| if i % 3 == 0 { 0.0 } else { rng.next_f64() })
        .collect();
    write_stick(&args.output, &targets, args.iterations, &mut rng)?;

    if !args.stick_only {
        let atoms = CylinderConfig::default().atoms;
        let preferred: Vec<usize> = (0..args.fibers)
            .map(|_| (rng.next_u64() % atoms as u64) as usize)
            .collect();
        write_cylinder(&args.output, &preferred, args.iterations, &mut rng)?;
    }

    println!(
        "Wrote {} fibres and {} iterations to {}",
        args.fibers,
        args.iterations,
        args.output.display()
    );
    Ok(())
}
