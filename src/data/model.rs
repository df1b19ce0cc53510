use std::fmt;

use glam::Vec3;
use thiserror::Error;

// ---------------------------------------------------------------------------
// MicrostructureModel – which COMMIT forward model produced the output
// ---------------------------------------------------------------------------

/// Intra-axonal compartment model of a COMMIT run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicrostructureModel {
    /// Stick-Zeppelin-Ball: weights are the raw intra-cellular coefficients.
    Stick,
    /// Cylinder-Zeppelin-Ball: weights are axon diameters in micrometres.
    Cylinder,
}

impl MicrostructureModel {
    /// All models, in the order they are offered to the user.
    pub const ALL: [MicrostructureModel; 2] =
        [MicrostructureModel::Stick, MicrostructureModel::Cylinder];

    /// Name fragment used in COMMIT's output directory layout.
    pub fn dir_stem(self) -> &'static str {
        match self {
            MicrostructureModel::Stick => "StickZeppelinBall",
            MicrostructureModel::Cylinder => "CylinderZeppelinBall",
        }
    }

    /// Label shown next to the colour bar.
    pub fn weight_label(self) -> &'static str {
        match self {
            MicrostructureModel::Stick => "weight",
            MicrostructureModel::Cylinder => "diameter",
        }
    }
}

impl fmt::Display for MicrostructureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MicrostructureModel::Stick => write!(f, "Stick"),
            MicrostructureModel::Cylinder => write!(f, "Cylinder"),
        }
    }
}

// ---------------------------------------------------------------------------
// Streamline – one fibre path
// ---------------------------------------------------------------------------

/// A reconstructed fibre path: an ordered sequence of 3D points.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub points: Vec<Vec3>,
}

impl Streamline {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

// ---------------------------------------------------------------------------
// IterationWeights – one snapshot of the solver
// ---------------------------------------------------------------------------

/// Weights of every loaded streamline at one solver iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationWeights {
    /// Display label, the coefficient file stem padded to four digits.
    pub label: String,
    pub weights: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box of the loaded geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal.
    pub fn extent(&self) -> f32 {
        (self.max - self.min).length()
    }

    fn from_streamlines(streamlines: &[Streamline]) -> Option<Self> {
        let mut points = streamlines.iter().flat_map(|s| s.points.iter().copied());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Bounds { min, max })
    }
}

// ---------------------------------------------------------------------------
// ConvergenceData – the complete loaded session input
// ---------------------------------------------------------------------------

/// Invariant violations when assembling a [`ConvergenceData`].
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no iterations were loaded")]
    NoIterations,

    #[error("iteration {label} has {found} weights but {expected} streamlines are loaded")]
    WeightCountMismatch {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("iteration {label} contains a non-finite weight at streamline {index}")]
    NonFiniteWeight { label: String, index: usize },

    #[error("streamline {index} has {points} point(s), at least 2 are needed to draw it")]
    TooFewPoints { index: usize, points: usize },
}

/// Streamlines plus their weights over all iterations. Immutable once built.
///
/// Every streamline has at least one segment, so every streamline carries
/// at least one colour.
#[derive(Debug, Clone)]
pub struct ConvergenceData {
    pub model: MicrostructureModel,
    streamlines: Vec<Streamline>,
    iterations: Vec<IterationWeights>,
    max_weight: f64,
    bounds: Option<Bounds>,
}

impl ConvergenceData {
    /// Validate and assemble the dataset.
    pub fn new(
        model: MicrostructureModel,
        streamlines: Vec<Streamline>,
        iterations: Vec<IterationWeights>,
    ) -> Result<Self, ModelError> {
        if iterations.is_empty() {
            return Err(ModelError::NoIterations);
        }
        let short = streamlines.iter().enumerate().find(|(_, s)| s.points.len() < 2);
        if let Some((index, s)) = short {
            return Err(ModelError::TooFewPoints {
                index,
                points: s.points.len(),
            });
        }
        for it in &iterations {
            if it.weights.len() != streamlines.len() {
                return Err(ModelError::WeightCountMismatch {
                    label: it.label.clone(),
                    expected: streamlines.len(),
                    found: it.weights.len(),
                });
            }
            if let Some(index) = it.weights.iter().position(|w| !w.is_finite()) {
                return Err(ModelError::NonFiniteWeight {
                    label: it.label.clone(),
                    index,
                });
            }
        }

        let max_weight = iterations
            .iter()
            .flat_map(|it| it.weights.iter().copied())
            .fold(0.0_f64, f64::max);
        let bounds = Bounds::from_streamlines(&streamlines);

        Ok(Self {
            model,
            streamlines,
            iterations,
            max_weight,
            bounds,
        })
    }

    pub fn streamlines(&self) -> &[Streamline] {
        &self.streamlines
    }

    pub fn iterations(&self) -> &[IterationWeights] {
        &self.iterations
    }

    /// Number of streamlines.
    pub fn len(&self) -> usize {
        self.streamlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streamlines.is_empty()
    }

    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// Highest valid iteration index.
    pub fn max_iteration(&self) -> usize {
        self.iterations.len() - 1
    }

    /// Largest weight across every iteration (0 when all weights are ≤ 0).
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Weights at `iteration`, which must be `<= max_iteration()`.
    pub fn weights_at(&self, iteration: usize) -> &[f64] {
        &self.iterations[iteration].weights
    }

    pub fn label_at(&self, iteration: usize) -> &str {
        &self.iterations[iteration].label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, offset: f32) -> Streamline {
        Streamline::new((0..n).map(|i| Vec3::new(i as f32, offset, 0.0)).collect())
    }

    #[test]
    fn test_rejects_weight_count_mismatch() {
        let err = ConvergenceData::new(
            MicrostructureModel::Stick,
            vec![line(3, 0.0), line(3, 1.0)],
            vec![IterationWeights {
                label: "0000".into(),
                weights: vec![0.1],
            }],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::WeightCountMismatch {
                label: "0000".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_rejects_empty_iterations_and_nan() {
        let err = ConvergenceData::new(MicrostructureModel::Stick, vec![line(2, 0.0)], vec![])
            .unwrap_err();
        assert_eq!(err, ModelError::NoIterations);
        let err = ConvergenceData::new(
            MicrostructureModel::Stick,
            vec![line(2, 0.0)],
            vec![IterationWeights {
                label: "0001".into(),
                weights: vec![f64::NAN],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteWeight { index: 0, .. }));
    }

    #[test]
    fn test_rejects_streamlines_without_segments() {
        let iteration = |n: usize| IterationWeights {
            label: "0000".into(),
            weights: vec![0.5; n],
        };
        let err = ConvergenceData::new(
            MicrostructureModel::Stick,
            vec![line(3, 0.0), line(1, 1.0)],
            vec![iteration(2)],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::TooFewPoints { index: 1, points: 1 });

        let err = ConvergenceData::new(
            MicrostructureModel::Stick,
            vec![line(0, 0.0)],
            vec![iteration(1)],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::TooFewPoints { index: 0, points: 0 });
    }

    #[test]
    fn test_max_weight_and_bounds() {
        let data = ConvergenceData::new(
            MicrostructureModel::Cylinder,
            vec![line(4, 0.0), line(2, 5.0)],
            vec![
                IterationWeights {
                    label: "0000".into(),
                    weights: vec![0.5, 1.5],
                },
                IterationWeights {
                    label: "0001".into(),
                    weights: vec![2.5, 0.0],
                },
            ],
        )
        .unwrap();
        assert_eq!(data.max_weight(), 2.5);
        assert_eq!(data.max_iteration(), 1);
        let b = data.bounds().unwrap();
        assert_eq!(b.min, Vec3::ZERO);
        assert_eq!(b.max, Vec3::new(3.0, 5.0, 0.0));
        assert_eq!(data.label_at(1), "0001");
    }
}
