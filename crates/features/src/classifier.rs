//! Crowding classification.
//!
//! A week is extreme for a category when either its percentile rank or its
//! z-score crosses the configured threshold in the category's direction.
//! Each operand is evaluated on its own; a missing operand never triggers.

use crate::rolling::RollingPoint;
use cot_core::{CrowdingDirection, SignalConfig};

/// Threshold set for crowding classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdingThresholds {
    /// Percentile at or above which a category is long-crowded.
    pub long_percentile: f64,
    /// Percentile at or below which a category is short-crowded.
    pub short_percentile: f64,
    /// Absolute z-score threshold.
    pub z: f64,
}

impl CrowdingThresholds {
    pub fn from_config(config: &SignalConfig) -> Self {
        Self {
            long_percentile: config.long_crowded_percentile,
            short_percentile: config.short_crowded_percentile,
            z: config.extreme_z_threshold,
        }
    }

    /// Long-crowded: `percentile >= P_long OR z >= Z`.
    pub fn is_long_crowded(&self, percentile_rank: Option<f64>, z_score: Option<f64>) -> bool {
        let by_rank = percentile_rank.is_some_and(|p| p >= self.long_percentile);
        let by_z = z_score.is_some_and(|z| z >= self.z);
        by_rank || by_z
    }

    /// Short-crowded: `percentile <= P_short OR z <= -Z`.
    pub fn is_short_crowded(&self, percentile_rank: Option<f64>, z_score: Option<f64>) -> bool {
        let by_rank = percentile_rank.is_some_and(|p| p <= self.short_percentile);
        let by_z = z_score.is_some_and(|z| z <= -self.z);
        by_rank || by_z
    }

    /// Evaluate a rolling point in the given direction.
    pub fn is_extreme(&self, direction: CrowdingDirection, point: &RollingPoint) -> bool {
        match direction {
            CrowdingDirection::Long => self.is_long_crowded(point.percentile_rank, point.z_score),
            CrowdingDirection::Short => self.is_short_crowded(point.percentile_rank, point.z_score),
        }
    }
}

impl Default for CrowdingThresholds {
    fn default() -> Self {
        Self::from_config(&SignalConfig::default())
    }
}
