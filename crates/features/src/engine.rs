//! Signal computation engine.
//!
//! Groups raw rows by contract, orders each contract's series by report date
//! and runs every tracked category through net position, rolling statistics,
//! classification and confirmation, then derives the trade decision.

use crate::{
    classifier::CrowdingThresholds,
    confirmation::ConfirmationTracker,
    decision::decide,
    net_position::net_pct_oi,
    rolling::RollingStats,
};
use cot_core::{
    CategoryConfig, CategorySignal, Config, Contract, DecisionPolicy, NormalizedRow,
    RawReportRow, Result, SignalConfig, TraderCategory,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-category accumulator state within one contract.
#[derive(Debug, Clone)]
struct CategoryTracker {
    config: CategoryConfig,
    rolling: RollingStats,
    confirmation: ConfirmationTracker,
}

impl CategoryTracker {
    fn new(config: CategoryConfig, signal: &SignalConfig) -> Self {
        Self {
            config,
            rolling: RollingStats::new(signal.lookback_weeks, signal.min_sample()),
            confirmation: ConfirmationTracker::new(signal.confirm_weeks),
        }
    }

    fn push(&mut self, row: &RawReportRow, thresholds: &CrowdingThresholds) -> CategorySignal {
        let positions = row.positions_for(self.config.category);
        let net_pct = net_pct_oi(positions, row.open_interest);
        let point = self.rolling.push(net_pct);
        let is_extreme = thresholds.is_extreme(self.config.direction, &point);
        let is_confirmed = self.confirmation.push(is_extreme);

        CategorySignal {
            category: self.config.category,
            direction: self.config.direction,
            long: positions.long,
            short: positions.short,
            net: positions.net(),
            net_pct_oi: net_pct,
            z_score: point.z_score,
            percentile_rank: point.percentile_rank,
            is_extreme,
            is_confirmed,
        }
    }
}

/// Isolated accumulator state for one contract's series.
///
/// Rows must be pushed in ascending report-date order. Pushing a series one
/// row at a time yields exactly what [`SignalEngine::compute`] yields.
#[derive(Debug, Clone)]
pub struct ContractAccumulator {
    contract: Contract,
    trackers: Vec<CategoryTracker>,
    thresholds: CrowdingThresholds,
    decision: DecisionPolicy,
    rows_seen: usize,
}

impl ContractAccumulator {
    /// Process the next row of this contract.
    pub fn push(&mut self, row: &RawReportRow) -> NormalizedRow {
        debug_assert_eq!(row.contract, self.contract);
        self.rows_seen += 1;

        let categories: Vec<CategorySignal> = self
            .trackers
            .iter_mut()
            .map(|t| t.push(row, &self.thresholds))
            .collect();

        let confirmed = |category: TraderCategory| {
            categories
                .iter()
                .any(|s: &CategorySignal| s.category == category && s.is_confirmed)
        };
        let trade_decision = decide(
            confirmed(self.decision.fade_long),
            confirmed(self.decision.fade_short),
        );

        let z = self.thresholds.z;
        let extreme_crowding = categories
            .iter()
            .any(|s| s.z_score.is_some_and(|v| v.abs() >= z));

        NormalizedRow {
            report_date: row.report_date,
            contract: row.contract,
            market_name: row.market_name.clone(),
            open_interest: row.open_interest,
            categories,
            extreme_crowding,
            trade_decision,
        }
    }

    /// Rows processed so far.
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }
}

/// Signal computation engine.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    signal: SignalConfig,
    categories: Vec<CategoryConfig>,
    decision: DecisionPolicy,
    thresholds: CrowdingThresholds,
}

impl SignalEngine {
    /// Create a new engine from configuration.
    ///
    /// Fails with a configuration error before anything is computed.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            signal: config.signal.clone(),
            categories: config.categories.clone(),
            decision: config.decision,
            thresholds: CrowdingThresholds::from_config(&config.signal),
        })
    }

    /// Fresh accumulator for one contract.
    pub fn accumulator(&self, contract: Contract) -> ContractAccumulator {
        ContractAccumulator {
            contract,
            trackers: self
                .categories
                .iter()
                .cloned()
                .map(|c| CategoryTracker::new(c, &self.signal))
                .collect(),
            thresholds: self.thresholds,
            decision: self.decision,
            rows_seen: 0,
        }
    }

    /// Compute one output row per input row.
    ///
    /// Output is ordered by contract, then by report date.
    pub fn compute(&self, rows: &[RawReportRow]) -> Vec<NormalizedRow> {
        let mut by_contract: BTreeMap<Contract, Vec<&RawReportRow>> = BTreeMap::new();
        for row in rows {
            by_contract.entry(row.contract).or_default().push(row);
        }

        let mut out = Vec::with_capacity(rows.len());
        for (contract, mut series) in by_contract {
            series.sort_by_key(|r| r.report_date);
            if series.windows(2).any(|w| w[0].report_date == w[1].report_date) {
                warn!(%contract, "duplicate report dates in series; rows are processed in input order");
            }

            let mut acc = self.accumulator(contract);
            out.extend(series.into_iter().map(|row| acc.push(row)));
            debug!(%contract, rows = acc.rows_seen(), "computed contract series");
        }
        out
    }

    /// Signal configuration in use.
    pub fn signal_config(&self) -> &SignalConfig {
        &self.signal
    }
}
