/// Equal-width histogram of one iteration's weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` over `[min, max]`. The last bin is closed on the right;
    /// values outside the range are ignored.
    pub fn new(values: &[f64], min: f64, max: f64, bins: usize) -> Self {
        let bins = bins.max(1);
        let mut counts = vec![0; bins];
        let width = (max - min) / bins as f64;
        for &v in values {
            if !(min..=max).contains(&v) {
                continue;
            }
            let idx = if width > 0.0 {
                (((v - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }
        Self { min, max, counts }
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    /// Centre of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + self.bin_width() * (i as f64 + 0.5)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_closes_last_bin() {
        let h = Histogram::new(&[0.0, 0.1, 0.5, 0.99, 1.0, 1.5], 0.0, 1.0, 4);
        assert_eq!(h.counts, vec![2, 0, 1, 2]);
        assert_eq!(h.total(), 5);
        assert!((h.bin_center(0) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_range_uses_single_bin() {
        let h = Histogram::new(&[0.0, 0.0], 0.0, 0.0, 3);
        assert_eq!(h.counts, vec![2, 0, 0]);
    }
}
