//! Core data types for the crowded-cot system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Futures contract tracked in the TFF report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Contract {
    /// E-mini S&P 500.
    #[serde(rename = "ES")]
    Es,
    /// E-mini NASDAQ-100.
    #[serde(rename = "NQ")]
    Nq,
}

impl Contract {
    /// All known contracts, in display order.
    pub const ALL: [Contract; 2] = [Contract::Es, Contract::Nq];

    /// Short code, e.g. "ES".
    pub fn code(self) -> &'static str {
        match self {
            Contract::Es => "ES",
            Contract::Nq => "NQ",
        }
    }

    /// Parse a short code (case-insensitive, surrounding whitespace ignored).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// CFTC market names reported for this contract.
    ///
    /// CFTC naming is inconsistent across report vintages, so every alias is
    /// matched.
    pub fn market_aliases(self) -> &'static [&'static str] {
        match self {
            Contract::Es => &["E-mini S&P 500", "S&P 500 E-mini"],
            Contract::Nq => &["E-mini NASDAQ-100", "NASDAQ-100 E-mini"],
        }
    }

    /// Infer the contract from a free-text market name.
    ///
    /// Case-insensitive exact match against [`Contract::market_aliases`].
    pub fn from_market_name(name: &str) -> Option<Self> {
        let name = name.trim().to_uppercase();
        Self::ALL.into_iter().find(|c| {
            c.market_aliases()
                .iter()
                .any(|alias| alias.to_uppercase() == name)
        })
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Trader category reported in the TFF disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraderCategory {
    #[serde(rename = "AM")]
    AssetManagers,
    #[serde(rename = "LF")]
    LeveragedFunds,
    #[serde(rename = "DI")]
    Dealers,
    #[serde(rename = "OR")]
    OtherReportables,
    #[serde(rename = "NR")]
    NonReportables,
}

impl TraderCategory {
    pub const ALL: [TraderCategory; 5] = [
        TraderCategory::AssetManagers,
        TraderCategory::LeveragedFunds,
        TraderCategory::Dealers,
        TraderCategory::OtherReportables,
        TraderCategory::NonReportables,
    ];

    /// Short identifier, e.g. "AM".
    pub fn code(self) -> &'static str {
        match self {
            TraderCategory::AssetManagers => "AM",
            TraderCategory::LeveragedFunds => "LF",
            TraderCategory::Dealers => "DI",
            TraderCategory::OtherReportables => "OR",
            TraderCategory::NonReportables => "NR",
        }
    }

    /// Parse a short identifier (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Lowercase prefix used for output column names, e.g. "am".
    pub fn column_prefix(self) -> String {
        self.code().to_lowercase()
    }

    /// Prefix of the long/short fields in source records, e.g. "asset_mgr".
    pub fn field_prefix(self) -> &'static str {
        match self {
            TraderCategory::AssetManagers => "asset_mgr",
            TraderCategory::LeveragedFunds => "lev_fund",
            TraderCategory::Dealers => "dealer",
            TraderCategory::OtherReportables => "other_rept",
            TraderCategory::NonReportables => "nonrept",
        }
    }
}

impl fmt::Display for TraderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Direction in which a category is considered crowded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdingDirection {
    Long,
    Short,
}

impl CrowdingDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            CrowdingDirection::Long => "long",
            CrowdingDirection::Short => "short",
        }
    }
}

impl fmt::Display for CrowdingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Long/short position counts for one category in one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPositions {
    pub long: Option<f64>,
    pub short: Option<f64>,
}

impl CategoryPositions {
    pub fn new(long: Option<f64>, short: Option<f64>) -> Self {
        Self { long, short }
    }

    /// Net contracts (long minus short), if both sides are present.
    #[inline]
    pub fn net(&self) -> Option<f64> {
        Some(self.long? - self.short?)
    }
}

/// One contract, one report week, as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReportRow {
    /// Report ("as of") date.
    pub report_date: NaiveDate,
    /// Contract identity.
    pub contract: Contract,
    /// Free-text market name from the source.
    pub market_name: String,
    /// Total open interest.
    pub open_interest: Option<f64>,
    /// Position counts per category. Categories absent here count as missing.
    pub positions: BTreeMap<TraderCategory, CategoryPositions>,
}

impl RawReportRow {
    /// Create a row with no category positions.
    pub fn new(report_date: NaiveDate, contract: Contract, open_interest: Option<f64>) -> Self {
        Self {
            report_date,
            contract,
            market_name: String::new(),
            open_interest,
            positions: BTreeMap::new(),
        }
    }

    /// Builder-style setter for one category's counts.
    pub fn with_positions(mut self, category: TraderCategory, long: Option<f64>, short: Option<f64>) -> Self {
        self.positions.insert(category, CategoryPositions::new(long, short));
        self
    }

    /// Counts for a category (both sides missing if not reported).
    pub fn positions_for(&self, category: TraderCategory) -> CategoryPositions {
        self.positions.get(&category).copied().unwrap_or_default()
    }
}

/// Final trade recommendation for one contract and week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDecision {
    No,
    YesLong,
    YesShort,
    YesConflict,
}

impl TradeDecision {
    pub const ALL: [TradeDecision; 4] = [
        TradeDecision::No,
        TradeDecision::YesLong,
        TradeDecision::YesShort,
        TradeDecision::YesConflict,
    ];

    /// Output label, e.g. "YES_LONG".
    pub fn as_str(self) -> &'static str {
        match self {
            TradeDecision::No => "NO",
            TradeDecision::YesLong => "YES_LONG",
            TradeDecision::YesShort => "YES_SHORT",
            TradeDecision::YesConflict => "YES_CONFLICT",
        }
    }

    /// Is a trade recommended at all?
    pub fn is_actionable(self) -> bool {
        !matches!(self, TradeDecision::No)
    }
}

impl fmt::Display for TradeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived per-category metrics for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySignal {
    /// Category.
    pub category: TraderCategory,
    /// Crowding direction evaluated for this category.
    pub direction: CrowdingDirection,
    /// Long contracts.
    pub long: Option<f64>,
    /// Short contracts.
    pub short: Option<f64>,
    /// Net contracts (long - short).
    pub net: Option<f64>,
    /// Net position as percent of open interest.
    pub net_pct_oi: Option<f64>,
    /// Rolling z-score of `net_pct_oi`.
    pub z_score: Option<f64>,
    /// Inclusive rolling percentile rank of `net_pct_oi` (0-100).
    pub percentile_rank: Option<f64>,
    /// Crowded in `direction` this week.
    pub is_extreme: bool,
    /// Crowded in `direction` for the whole confirmation window.
    pub is_confirmed: bool,
}

/// One output row: the raw inputs plus every derived field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub report_date: NaiveDate,
    pub contract: Contract,
    pub market_name: String,
    pub open_interest: Option<f64>,
    /// Per-category signals, in configured category order.
    pub categories: Vec<CategorySignal>,
    /// Legacy display flag: any category with |z| >= the z threshold.
    pub extreme_crowding: bool,
    pub trade_decision: TradeDecision,
}

impl NormalizedRow {
    /// Signal for a category, if tracked.
    pub fn category(&self, category: TraderCategory) -> Option<&CategorySignal> {
        self.categories.iter().find(|s| s.category == category)
    }
}
