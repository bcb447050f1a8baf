use serde::Serialize;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation (denominator N) given a
/// pre-computed mean. Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Running sum/count pair. Merging two accumulators gives the exact mean of
/// the union, which a mean of means would not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeanAccumulator {
    pub sum: f64,
    pub count: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &MeanAccumulator) {
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_stddev_is_population() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(stddev(&values, mean(&values)), 2.0);
    }

    #[test]
    fn test_accumulator_merge_is_exact() {
        let mut a = MeanAccumulator::default();
        a.push(1.0);
        let mut b = MeanAccumulator::default();
        b.push(2.0);
        b.push(3.0);
        a.merge(&b);
        assert_eq!(a.mean(), Some(2.0));
        assert_eq!(MeanAccumulator::default().mean(), None);
    }
}
