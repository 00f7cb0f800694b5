//! Online statistics over the engine's per-tick histories.
//!
//! Returns and unfilled fractions are append-only series whose mean and
//! population standard deviation are needed every tick. `OnlineStats`
//! keeps those in O(1) with Welford's update so no series has to be
//! stored or rescanned. `RecentWindow` keeps a bounded tail of raw
//! samples for inspection.

use std::collections::VecDeque;

/// Welford running mean / population variance over every sample pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnlineStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl OnlineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of all samples. 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Population variance (divide by n). 0 when empty.
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            // m2 can drift a hair below zero on near-constant series
            (self.m2 / self.count as f64).max(0.0)
        }
    }

    /// Population standard deviation (divide by n). 0 when empty.
    pub fn population_std(&self) -> f64 {
        self.population_variance().sqrt()
    }
}

/// Fixed-capacity tail of the most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct RecentWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RecentWindow {
    /// Create a window holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, x: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(x);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_mean(xs: &[f64]) -> f64 {
        xs.iter().sum::<f64>() / xs.len() as f64
    }

    fn naive_population_std(xs: &[f64]) -> f64 {
        let m = naive_mean(xs);
        (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
    }

    #[test]
    fn test_empty_stats() {
        let stats = OnlineStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.population_std(), 0.0);
    }

    #[test]
    fn test_matches_naive_computation() {
        let xs = [0.001, -0.002, 0.0035, 0.0, 0.0007, -0.0011, 0.0042];
        let mut stats = OnlineStats::new();
        for x in xs {
            stats.push(x);
        }
        assert_eq!(stats.count(), xs.len());
        assert!((stats.mean() - naive_mean(&xs)).abs() < 1e-15);
        assert!((stats.population_std() - naive_population_std(&xs)).abs() < 1e-15);
    }

    #[test]
    fn test_constant_series_has_zero_variance() {
        let mut stats = OnlineStats::new();
        for _ in 0..50 {
            stats.push(0.0025);
        }
        assert_eq!(stats.population_variance(), 0.0);
        assert_eq!(stats.population_std(), 0.0);
    }

    #[test]
    fn test_single_sample() {
        let mut stats = OnlineStats::new();
        stats.push(0.5);
        assert_eq!(stats.mean(), 0.5);
        assert_eq!(stats.population_std(), 0.0);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = RecentWindow::new(3);
        for x in [1.0, 2.0, 3.0, 4.0] {
            window.push(x);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.last(), Some(4.0));
    }

    #[test]
    fn test_window_zero_capacity_clamped() {
        let mut window = RecentWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.to_vec(), vec![2.0]);
    }
}
