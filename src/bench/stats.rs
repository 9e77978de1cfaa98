use std::collections::VecDeque;

/// Aggregate of the fps samples collected for one configuration.
///
/// All fields are zero when there are no samples; `std` is the sample standard deviation
/// (n - 1) and is zero below two samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FpsStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub samples: usize,
}

impl FpsStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::default();
        }
        let sum: f64 = samples.iter().sum();
        let avg = sum / n as f64;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std = if n < 2 {
            0.0
        } else {
            let acc: f64 = samples.iter().map(|v| (v - avg) * (v - avg)).sum();
            (acc / (n - 1) as f64).sqrt()
        };
        Self {
            avg,
            min,
            max,
            std,
            samples: n,
        }
    }
}

/// Sliding-window average of instantaneous fps, as shown in the live title line.
#[derive(Clone, Debug)]
pub struct FpsAverager {
    window: usize,
    values: VecDeque<f64>,
}

impl FpsAverager {
    pub const DEFAULT_WINDOW: usize = 120;

    /// Intervals at or below this many seconds are ignored.
    pub const MIN_INTERVAL_SECS: f64 = 1e-6;

    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Record one frame interval and return the current average.
    pub fn push_interval(&mut self, dt_secs: f64) -> f64 {
        if dt_secs.is_finite() && dt_secs > Self::MIN_INTERVAL_SECS {
            if self.values.len() == self.window {
                self.values.pop_front();
            }
            self.values.push_back(1.0 / dt_secs);
        }
        self.average()
    }

    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.values.iter().sum::<f64>() / self.values.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for FpsAverager {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bench/stats.rs"]
mod tests;
