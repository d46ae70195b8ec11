//! Rolling statistics over a contract's net-position series.
//!
//! The window holds up to `lookback` most-recent rows (missing values
//! included) ending at the current row. Statistics are computed over the
//! non-missing values in that window, so row `i` only ever sees rows `<= i`.

use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Statistics for one point of the series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingPoint {
    /// Non-missing values in the window.
    pub count: usize,
    /// Window mean.
    pub mean: Option<f64>,
    /// Window sample standard deviation (n - 1).
    pub std: Option<f64>,
    /// `(value - mean) / std`.
    pub z_score: Option<f64>,
    /// Inclusive percentile rank of the value within the window (0-100).
    pub percentile_rank: Option<f64>,
}

/// Incremental trailing-window statistics.
///
/// Every push recomputes from the retained window rather than from running
/// sums, so appending one row at a time gives bit-identical results to a full
/// recompute of the series.
#[derive(Debug, Clone)]
pub struct RollingStats {
    /// Window size in rows.
    lookback: usize,
    /// Minimum non-missing values before z-score/percentile are produced.
    min_sample: usize,
    /// Recent values, oldest first.
    window: VecDeque<Option<f64>>,
}

impl RollingStats {
    /// Create a new accumulator.
    ///
    /// `min_required` is capped at `lookback`.
    pub fn new(lookback: usize, min_required: usize) -> Self {
        let lookback = lookback.max(1);
        Self {
            lookback,
            min_sample: lookback.min(min_required),
            window: VecDeque::with_capacity(lookback),
        }
    }

    /// Append the next observation and return its statistics.
    pub fn push(&mut self, value: Option<f64>) -> RollingPoint {
        let value = value.filter(|v| v.is_finite());

        if self.window.len() >= self.lookback {
            self.window.pop_front();
        }
        self.window.push_back(value);

        self.current(value)
    }

    fn current(&self, value: Option<f64>) -> RollingPoint {
        let values: Vec<f64> = self.window.iter().flatten().copied().collect();
        let count = values.len();

        let mean = (count > 0).then(|| values.iter().mean());
        let std = (count > 1).then(|| values.iter().std_dev());

        if count < self.min_sample {
            return RollingPoint {
                count,
                mean,
                std,
                z_score: None,
                percentile_rank: None,
            };
        }

        let z_score = match (value, mean, std) {
            (Some(v), Some(m), Some(s)) if s.is_finite() && s > 0.0 => Some((v - m) / s),
            _ => None,
        };

        let percentile_rank = value.filter(|_| count > 0).map(|v| {
            let at_or_below = values.iter().filter(|&&x| x <= v).count();
            100.0 * at_or_below as f64 / count as f64
        });

        RollingPoint {
            count,
            mean,
            std,
            z_score,
            percentile_rank,
        }
    }
}

/// Statistics for every point of a chronologically ordered series.
pub fn rolling_statistics(series: &[Option<f64>], lookback: usize, min_required: usize) -> Vec<RollingPoint> {
    let mut stats = RollingStats::new(lookback, min_required);
    series.iter().map(|&v| stats.push(v)).collect()
}
