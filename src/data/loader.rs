use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::model::{ConvergenceData, IterationWeights, MicrostructureModel};
use super::{npy, trk};
use crate::config::CylinderConfig;

/// Dictionary tractogram written by COMMIT next to its results.
pub const DICTIONARY_TRK: &str = "dictionary_TRK_fibers.trk";

// ---------------------------------------------------------------------------
// Output directory layout
// ---------------------------------------------------------------------------

/// `<dir>/Results_<Model>ZeppelinBall`
pub fn results_dir(dir: &Path, model: MicrostructureModel) -> PathBuf {
    dir.join(format!("Results_{}", model.dir_stem()))
}

/// `<dir>/Coeff_x_<Model>ZeppelinBall`
pub fn coefficients_dir(dir: &Path, model: MicrostructureModel) -> PathBuf {
    dir.join(format!("Coeff_x_{}", model.dir_stem()))
}

/// Models whose results directory exists, in [`MicrostructureModel::ALL`] order.
pub fn discover_models(dir: &Path) -> Vec<MicrostructureModel> {
    MicrostructureModel::ALL
        .into_iter()
        .filter(|&m| results_dir(dir, m).is_dir())
        .collect()
}

/// Map a 1-based answer to the model prompt onto one of `models`.
pub fn parse_model_choice(
    input: &str,
    models: &[MicrostructureModel],
) -> Option<MicrostructureModel> {
    let choice: usize = input.trim().parse().ok()?;
    models.get(choice.checked_sub(1)?).copied()
}

/// One coefficient file per solver iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationFile {
    pub number: u64,
    pub label: String,
    pub path: PathBuf,
}

/// List `<digits>.npy` files in the coefficient directory, sorted numerically.
///
/// Files are left untouched; labels are zero-padded to four digits for
/// display only.
pub fn list_iterations(dir: &Path, model: MicrostructureModel) -> Result<Vec<IterationFile>> {
    let coeff_dir = coefficients_dir(dir, model);
    let entries = std::fs::read_dir(&coeff_dir)
        .with_context(|| format!("reading coefficient directory {}", coeff_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.context("listing coefficient directory")?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("npy") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(number) = stem.parse::<u64>() else {
            continue;
        };
        files.push(IterationFile {
            number,
            label: format!("{stem:0>4}"),
            path,
        });
    }
    files.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.label.cmp(&b.label)));

    if files.is_empty() {
        bail!("no iteration files (<number>.npy) found in {}", coeff_dir.display());
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// Weight extraction
// ---------------------------------------------------------------------------

/// Stick model: the first `n_fibers` coefficients, truncated to `keep`.
pub fn stick_weights(coefficients: &[f64], n_fibers: usize, keep: usize) -> Result<Vec<f64>> {
    if coefficients.len() < n_fibers {
        bail!(
            "coefficient vector has {} entries but the dictionary holds {n_fibers} fibres",
            coefficients.len()
        );
    }
    Ok(coefficients[..keep.min(n_fibers)].to_vec())
}

/// Cylinder model: coefficient-weighted mean radius of the IC atoms, as a
/// diameter in micrometres.
pub fn cylinder_diameters(
    coefficients: &[f64],
    n_fibers: usize,
    radii_m: &[f64],
    keep: usize,
) -> Result<Vec<f64>> {
    let needed = n_fibers * radii_m.len();
    if coefficients.len() < needed {
        bail!(
            "coefficient vector has {} entries, expected at least {needed} \
             ({} atoms x {n_fibers} fibres)",
            coefficients.len(),
            radii_m.len()
        );
    }
    let keep = keep.min(n_fibers);
    Ok((0..keep)
        .map(|f| {
            let (num, den) = radii_m.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, &r)| {
                let x = coefficients[i * n_fibers + f];
                (num + x * r, den + x)
            });
            2.0 * (num / (den + f64::EPSILON)) * 1e6
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load streamlines and every iteration's weights for `model`.
///
/// Any missing or malformed input fails the whole load.
pub fn load(
    dir: &Path,
    model: MicrostructureModel,
    max_streamlines: usize,
    cylinder: &CylinderConfig,
) -> Result<ConvergenceData> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    if !results_dir(dir, model).is_dir() {
        bail!("no {model} results in {}", dir.display());
    }

    let files = list_iterations(dir, model)?;
    let tractogram = trk::read(&dir.join(DICTIONARY_TRK), max_streamlines)?;
    let n_fibers = tractogram.total;
    let keep = tractogram.streamlines.len();
    log::debug!("dictionary holds {n_fibers} fibres, keeping {keep}");

    let radii = cylinder.radii_m();
    let mut iterations = Vec::with_capacity(files.len());
    for file in &files {
        let coefficients = npy::read_f64(&file.path)?;
        let weights = match model {
            MicrostructureModel::Stick => stick_weights(&coefficients, n_fibers, keep),
            MicrostructureModel::Cylinder => {
                cylinder_diameters(&coefficients, n_fibers, &radii, keep)
            }
        }
        .with_context(|| format!("iteration {}", file.label))?;
        iterations.push(IterationWeights {
            label: file.label.clone(),
            weights,
        });
    }

    let data = ConvergenceData::new(model, tractogram.streamlines, iterations)?;
    log::info!(
        "Loaded {} streamlines over {} iterations ({model} model, max weight {:.4})",
        data.len(),
        data.iteration_count(),
        data.max_weight()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Streamline;
    use glam::Vec3;

    fn write_fixture(
        dir: &Path,
        model: MicrostructureModel,
        n_fibers: usize,
        iterations: &[(&str, Vec<f64>)],
    ) {
        std::fs::create_dir_all(results_dir(dir, model)).unwrap();
        let coeff = coefficients_dir(dir, model);
        std::fs::create_dir_all(&coeff).unwrap();
        for (name, values) in iterations {
            npy::write_f64(&coeff.join(format!("{name}.npy")), values).unwrap();
        }
        let streamlines: Vec<Streamline> = (0..n_fibers)
            .map(|i| Streamline::new(vec![Vec3::ZERO, Vec3::new(1.0, i as f32, 0.0)]))
            .collect();
        trk::write(&dir.join(DICTIONARY_TRK), &streamlines).unwrap();
    }

    #[test]
    fn test_discover_and_choose_models() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_models(dir.path()).is_empty());

        std::fs::create_dir_all(results_dir(dir.path(), MicrostructureModel::Cylinder)).unwrap();
        std::fs::create_dir_all(results_dir(dir.path(), MicrostructureModel::Stick)).unwrap();
        let models = discover_models(dir.path());
        assert_eq!(models, vec![MicrostructureModel::Stick, MicrostructureModel::Cylinder]);

        assert_eq!(parse_model_choice(" 2\n", &models), Some(MicrostructureModel::Cylinder));
        assert_eq!(parse_model_choice("1", &models), Some(MicrostructureModel::Stick));
        assert_eq!(parse_model_choice("0", &models), None);
        assert_eq!(parse_model_choice("3", &models), None);
        assert_eq!(parse_model_choice("stick", &models), None);
    }

    #[test]
    fn test_iterations_sorted_numerically_and_unrenamed() {
        let dir = tempfile::tempdir().unwrap();
        let model = MicrostructureModel::Stick;
        write_fixture(
            dir.path(),
            model,
            1,
            &[("10", vec![0.1]), ("2", vec![0.2]), ("0003", vec![0.3]), ("norm_fib", vec![1.0])],
        );

        let files = list_iterations(dir.path(), model).unwrap();
        let labels: Vec<&str> = files.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["0002", "0003", "0010"]);
        assert!(coefficients_dir(dir.path(), model).join("2.npy").exists());
    }

    #[test]
    fn test_load_stick_truncates_to_max_streamlines() {
        let dir = tempfile::tempdir().unwrap();
        let model = MicrostructureModel::Stick;
        // 3 fibres; coefficient vectors also carry EC/ISO entries after nF
        write_fixture(
            dir.path(),
            model,
            3,
            &[("0", vec![0.1, 0.2, 0.3, 9.0, 9.0]), ("1", vec![0.4, 0.5, 0.6, 9.0, 9.0])],
        );

        let data = load(dir.path(), model, 2, &CylinderConfig::default()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.iteration_count(), 2);
        assert_eq!(data.weights_at(1), &[0.4, 0.5]);
        assert_eq!(data.max_weight(), 0.5);
    }

    #[test]
    fn test_load_cylinder_uses_dictionary_total() {
        let dir = tempfile::tempdir().unwrap();
        let model = MicrostructureModel::Cylinder;
        let cylinder = CylinderConfig {
            radius_min_um: 1.0,
            radius_max_um: 3.0,
            atoms: 2,
        };
        // 3 fibres, atom-major: [atom0 f0..f2, atom1 f0..f2]
        write_fixture(
            dir.path(),
            model,
            3,
            &[
                ("0", vec![1.0, 0.0, 0.5, 0.0, 1.0, 0.5]),
                ("1", vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0]),
            ],
        );

        // only 2 streamlines kept, but the layout is indexed by all 3 fibres
        let data = load(dir.path(), model, 2, &cylinder).unwrap();
        assert_eq!(data.len(), 2);
        let first = data.weights_at(0);
        assert!((first[0] - 2.0).abs() < 1e-6);
        assert!((first[1] - 6.0).abs() < 1e-6);
        let second = data.weights_at(1);
        assert!((second[0] - 6.0).abs() < 1e-6);
        assert!((second[1] - 2.0).abs() < 1e-6);
        assert!((data.max_weight() - 6.0).abs() < 1e-6);

        // a vector sized for the kept streamlines only is rejected
        write_fixture(dir.path(), model, 3, &[("2", vec![1.0; 4])]);
        assert!(load(dir.path(), model, 2, &cylinder).is_err());
    }

    #[test]
    fn test_cylinder_diameter_formula() {
        let radii = [1e-6, 3e-6];
        // 2 fibres: fibre 0 all on atom 0, fibre 1 split evenly
        let coefficients = [1.0, 0.5, 0.0, 0.5];
        let d = cylinder_diameters(&coefficients, 2, &radii, 2).unwrap();
        assert!((d[0] - 2.0).abs() < 1e-9);
        assert!((d[1] - 4.0).abs() < 1e-9);

        assert!(cylinder_diameters(&coefficients[..3], 2, &radii, 2).is_err());
    }

    #[test]
    fn test_load_failures_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let model = MicrostructureModel::Stick;
        assert!(load(&dir.path().join("missing"), model, 10, &CylinderConfig::default()).is_err());

        // results directory present but no tractogram
        std::fs::create_dir_all(results_dir(dir.path(), model)).unwrap();
        let coeff = coefficients_dir(dir.path(), model);
        std::fs::create_dir_all(&coeff).unwrap();
        npy::write_f64(&coeff.join("0.npy"), &[0.1]).unwrap();
        assert!(load(dir.path(), model, 10, &CylinderConfig::default()).is_err());

        // coefficient vector shorter than the dictionary
        write_fixture(dir.path(), model, 4, &[("0", vec![0.1])]);
        assert!(load(dir.path(), model, 10, &CylinderConfig::default()).is_err());
    }
}
