//! Configuration structures for the crowded-cot system.

use crate::error::{Error, Result};
use crate::types::{CrowdingDirection, TraderCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rolling statistics and threshold configuration.
    pub signal: SignalConfig,
    /// Tracked trader categories, in output order.
    pub categories: Vec<CategoryConfig>,
    /// Which categories drive the trade decision.
    pub decision: DecisionPolicy,
    /// Remote data source configuration.
    pub source: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            categories: vec![
                CategoryConfig::new(TraderCategory::AssetManagers, CrowdingDirection::Long),
                CategoryConfig::new(TraderCategory::LeveragedFunds, CrowdingDirection::Short),
            ],
            decision: DecisionPolicy::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Check every constraint the engine relies on.
    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;

        if self.categories.is_empty() {
            return Err(Error::config("at least one trader category must be tracked"));
        }
        let mut seen = HashSet::new();
        for cat in &self.categories {
            if !seen.insert(cat.category) {
                return Err(Error::config(format!(
                    "category {} is configured more than once",
                    cat.category
                )));
            }
            if cat.long_field.trim().is_empty() || cat.short_field.trim().is_empty() {
                return Err(Error::config(format!(
                    "category {} needs non-empty long/short field names",
                    cat.category
                )));
            }
        }

        self.check_trigger(self.decision.fade_long, CrowdingDirection::Long)?;
        self.check_trigger(self.decision.fade_short, CrowdingDirection::Short)?;
        if self.decision.fade_long == self.decision.fade_short {
            return Err(Error::config("decision policy needs two distinct categories"));
        }

        self.source.validate()
    }

    /// Configuration for a tracked category.
    pub fn category(&self, category: TraderCategory) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.category == category)
    }

    fn check_trigger(&self, category: TraderCategory, direction: CrowdingDirection) -> Result<()> {
        match self.category(category) {
            Some(cfg) if cfg.direction == direction => Ok(()),
            Some(cfg) => Err(Error::config(format!(
                "decision category {} must be tracked as {}-crowded, found {}",
                category, direction, cfg.direction
            ))),
            None => Err(Error::config(format!(
                "decision category {} is not tracked",
                category
            ))),
        }
    }
}

/// Rolling window, threshold and confirmation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Trailing window size in weeks.
    pub lookback_weeks: usize,
    /// Minimum non-missing observations in the window before statistics are produced.
    pub min_required_weeks: usize,
    /// Absolute z-score threshold for extreme positioning.
    pub extreme_z_threshold: f64,
    /// Percentile at or above which a category is long-crowded (0-100).
    pub long_crowded_percentile: f64,
    /// Percentile at or below which a category is short-crowded (0-100).
    pub short_crowded_percentile: f64,
    /// Consecutive extreme weeks required for confirmation.
    pub confirm_weeks: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            lookback_weeks: 260,
            min_required_weeks: 156,
            extreme_z_threshold: 2.0,
            long_crowded_percentile: 90.0,
            short_crowded_percentile: 10.0,
            confirm_weeks: 2,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_weeks == 0 {
            return Err(Error::config("lookback_weeks must be > 0"));
        }
        if self.min_required_weeks == 0 {
            return Err(Error::config("min_required_weeks must be > 0"));
        }
        if self.min_required_weeks > self.lookback_weeks {
            return Err(Error::config(format!(
                "min_required_weeks ({}) must not exceed lookback_weeks ({})",
                self.min_required_weeks, self.lookback_weeks
            )));
        }
        if !self.extreme_z_threshold.is_finite() || self.extreme_z_threshold < 0.0 {
            return Err(Error::config("extreme_z_threshold must be a finite value >= 0"));
        }
        for (name, value) in [
            ("long_crowded_percentile", self.long_crowded_percentile),
            ("short_crowded_percentile", self.short_crowded_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::config(format!("{name} must be within [0, 100], got {value}")));
            }
        }
        if self.confirm_weeks < 1 {
            return Err(Error::config("confirm_weeks must be >= 1"));
        }
        Ok(())
    }

    /// Effective minimum sample for z-score and percentile.
    #[inline]
    pub fn min_sample(&self) -> usize {
        self.lookback_weeks.min(self.min_required_weeks)
    }
}

/// Describes one tracked category: where its counts come from and which
/// crowding direction is evaluated.
///
/// Only `category` is required in a config file; field names default to the
/// standard `<prefix>_long`/`<prefix>_short` columns and the direction to
/// long for asset managers and short for every other category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CategoryConfigFile")]
pub struct CategoryConfig {
    pub category: TraderCategory,
    /// Source field holding long contracts.
    pub long_field: String,
    /// Source field holding short contracts.
    pub short_field: String,
    /// Direction of interest.
    pub direction: CrowdingDirection,
}

impl CategoryConfig {
    /// Descriptor with the standard field names for a category.
    pub fn new(category: TraderCategory, direction: CrowdingDirection) -> Self {
        let prefix = category.field_prefix();
        Self {
            category,
            long_field: format!("{prefix}_long"),
            short_field: format!("{prefix}_short"),
            direction,
        }
    }
}

/// Crowding direction assumed when a descriptor omits it: long for asset
/// managers, short for every other category.
fn default_direction(category: TraderCategory) -> CrowdingDirection {
    match category {
        TraderCategory::AssetManagers => CrowdingDirection::Long,
        _ => CrowdingDirection::Short,
    }
}

/// On-disk form of [`CategoryConfig`] with optional fields.
#[derive(Deserialize)]
struct CategoryConfigFile {
    category: TraderCategory,
    #[serde(default)]
    long_field: Option<String>,
    #[serde(default)]
    short_field: Option<String>,
    #[serde(default)]
    direction: Option<CrowdingDirection>,
}

impl From<CategoryConfigFile> for CategoryConfig {
    fn from(file: CategoryConfigFile) -> Self {
        let direction = file
            .direction
            .unwrap_or_else(|| default_direction(file.category));
        let mut config = CategoryConfig::new(file.category, direction);
        if let Some(field) = file.long_field {
            config.long_field = field;
        }
        if let Some(field) = file.short_field {
            config.short_field = field;
        }
        config
    }
}

/// Pair of opposing categories whose confirmed crowding drives the decision.
///
/// A confirmed long-crowded `fade_long` category recommends going short, a
/// confirmed short-crowded `fade_short` category recommends going long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    pub fade_long: TraderCategory,
    pub fade_short: TraderCategory,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            fade_long: TraderCategory::AssetManagers,
            fade_short: TraderCategory::LeveragedFunds,
        }
    }
}

/// CFTC public reporting API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API base URL.
    pub base_url: String,
    /// Dataset alias or explicit Socrata dataset id.
    pub dataset_id: String,
    /// Rows per page.
    pub page_size: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://publicreporting.cftc.gov".to_string(),
            dataset_id: "TFF_COMBINED".to_string(),
            page_size: 50_000,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::config("source.page_size must be > 0"));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::config("source.base_url must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.signal.lookback_weeks, 260);
        assert_eq!(config.signal.min_required_weeks, 156);
        assert_eq!(config.signal.confirm_weeks, 2);
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].long_field, "asset_mgr_long");
        assert_eq!(config.categories[1].short_field, "lev_fund_short");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_signal_params() {
        let mut config = Config::default();
        config.signal.lookback_weeks = 0;
        assert!(config.validate().unwrap_err().is_config());

        let mut config = Config::default();
        config.signal.min_required_weeks = 300;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.signal.confirm_weeks = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.signal.long_crowded_percentile = 101.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.signal.short_crowded_percentile = -0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.signal.extreme_z_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_sample() {
        let mut signal = SignalConfig::default();
        signal.lookback_weeks = 52;
        signal.min_required_weeks = 26;
        assert_eq!(signal.min_sample(), 26);
        signal.min_required_weeks = 80;
        assert_eq!(signal.min_sample(), 52);
    }

    #[test]
    fn test_rejects_bad_categories() {
        let mut config = Config::default();
        config.categories.push(CategoryConfig::new(
            TraderCategory::AssetManagers,
            CrowdingDirection::Short,
        ));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.categories[0].direction = CrowdingDirection::Short;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.categories.truncate(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extra_categories_are_allowed() {
        let mut config = Config::default();
        config.categories.push(CategoryConfig::new(
            TraderCategory::Dealers,
            CrowdingDirection::Short,
        ));
        assert!(config.validate().is_ok());
        assert_eq!(config.category(TraderCategory::Dealers).unwrap().long_field, "dealer_long");
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"signal": {{"lookback_weeks": 52, "min_required_weeks": 26}}}}"#).unwrap();

        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.signal.lookback_weeks, 52);
        assert_eq!(config.signal.min_required_weeks, 26);
        assert_eq!(config.signal.confirm_weeks, 2);
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.source.dataset_id, "TFF_COMBINED");
    }

    #[test]
    fn test_category_descriptor_defaults_field_names() {
        let json = r#"{"categories": [
            {"category": "AM", "direction": "long"},
            {"category": "LF", "direction": "short"},
            {"category": "DI", "direction": "short"}
        ]}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.categories.len(), 3);
        assert_eq!(
            config.categories[0],
            CategoryConfig::new(TraderCategory::AssetManagers, CrowdingDirection::Long)
        );
        assert_eq!(config.categories[2].long_field, "dealer_long");
        assert_eq!(config.categories[2].short_field, "dealer_short");
        config.validate().unwrap();
    }

    #[test]
    fn test_category_descriptor_default_direction_and_override() {
        let json = r#"{"categories": [
            {"category": "AM"},
            {"category": "LF", "long_field": "lf_l", "short_field": "lf_s"}
        ]}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.categories[0].direction, CrowdingDirection::Long);
        assert_eq!(config.categories[1].direction, CrowdingDirection::Short);
        assert_eq!(config.categories[1].long_field, "lf_l");
        assert_eq!(config.categories[1].short_field, "lf_s");
    }

    #[test]
    fn test_partial_decision_policy() {
        let config: Config = serde_json::from_str(r#"{"decision": {"fade_long": "AM"}}"#).unwrap();
        assert_eq!(config.decision.fade_long, TraderCategory::AssetManagers);
        assert_eq!(config.decision.fade_short, TraderCategory::LeveragedFunds);
    }
}
