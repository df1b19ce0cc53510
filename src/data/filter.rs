// ---------------------------------------------------------------------------
// Threshold interval: which weights count as "in range"
// ---------------------------------------------------------------------------

/// Where a weight falls relative to the threshold interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightBand {
    /// Below the lower threshold ("small weights subdued").
    Weak,
    /// Inside `[lower, upper]`, inclusive on both ends.
    InRange,
    /// Above the upper threshold ("big weights subdued").
    Strong,
}

/// An inclusive, ordered, finite weight interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdInterval {
    lower: f64,
    upper: f64,
}

impl ThresholdInterval {
    /// `[0, 0]`, used when the data offers no positive range.
    pub const ZERO: ThresholdInterval = ThresholdInterval { lower: 0.0, upper: 0.0 };

    /// Returns `None` when either bound is non-finite or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Option<Self> {
        if lower.is_finite() && upper.is_finite() && lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Classify a single weight.
    pub fn classify(&self, weight: f64) -> WeightBand {
        if weight < self.lower {
            WeightBand::Weak
        } else if weight > self.upper {
            WeightBand::Strong
        } else {
            WeightBand::InRange
        }
    }

    pub fn contains(&self, weight: f64) -> bool {
        self.classify(weight) == WeightBand::InRange
    }

    /// Number of weights inside the interval.
    pub fn count_in_range(&self, weights: &[f64]) -> usize {
        weights.iter().filter(|&&w| self.contains(w)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_and_non_finite() {
        assert!(ThresholdInterval::new(0.8, 0.2).is_none());
        assert!(ThresholdInterval::new(f64::NAN, 1.0).is_none());
        assert!(ThresholdInterval::new(0.0, f64::INFINITY).is_none());
        assert!(ThresholdInterval::new(0.5, 0.5).is_some());
    }

    #[test]
    fn test_classify_is_inclusive() {
        let t = ThresholdInterval::new(0.2, 0.8).unwrap();
        assert_eq!(t.classify(0.1), WeightBand::Weak);
        assert_eq!(t.classify(0.2), WeightBand::InRange);
        assert_eq!(t.classify(0.8), WeightBand::InRange);
        assert_eq!(t.classify(0.81), WeightBand::Strong);
        assert_eq!(t.count_in_range(&[0.0, 0.2, 0.5, 0.8, 1.0]), 3);
    }
}
