/// Streaming mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Adds one observation.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean; zero when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; zero with fewer than two observations.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Naive standard error of the mean, ignoring autocorrelation.
    pub fn standard_error(&self) -> Option<f64> {
        (self.count >= 2).then(|| (self.m2 / (self.count - 1) as f64 / self.count as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closed_form() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0] {
            stats.push(value);
        }
        assert_eq!(stats.count(), 4);
        assert!((stats.mean() - 2.5).abs() < 1e-12);
        assert!((stats.variance() - 1.25).abs() < 1e-12);
        let sem = stats.standard_error().unwrap();
        assert!((sem - (5.0_f64 / 3.0 / 4.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_observation_has_no_error_estimate() {
        let mut stats = RunningStats::default();
        stats.push(1.0);
        assert_eq!(stats.standard_error(), None);
        assert_eq!(stats.variance(), 0.0);
    }
}
