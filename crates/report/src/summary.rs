//! Latest-week selection and console summary.

use cot_core::{CategorySignal, Contract, NormalizedRow, TradeDecision};
use std::collections::BTreeMap;
use std::fmt::Write;

const NO_VALUE: &str = "n/a";

/// Per contract, the row with the latest report date. Ordered by contract.
pub fn latest_rows(rows: &[NormalizedRow]) -> Vec<&NormalizedRow> {
    let mut latest: BTreeMap<Contract, &NormalizedRow> = BTreeMap::new();
    for row in rows {
        latest
            .entry(row.contract)
            .and_modify(|current| {
                if row.report_date > current.report_date {
                    *current = row;
                }
            })
            .or_insert(row);
    }
    latest.into_values().collect()
}

/// Render the latest-week summary shown on stdout.
pub fn render_summary(rows: &[NormalizedRow]) -> String {
    let latest = latest_rows(rows);
    let Some(latest_date) = latest.iter().map(|r| r.report_date).max() else {
        return "No data returned.".to_string();
    };

    let mut out = format!("Latest report date: {latest_date}\n");
    for row in latest {
        let signals: Vec<String> = row.categories.iter().map(render_signal).collect();
        let _ = write!(
            out,
            "{} [{}]: {} -> {}",
            row.contract,
            row.report_date,
            signals.join(", "),
            row.trade_decision
        );
        if row.extreme_crowding {
            out.push_str(" **EXTREME**");
        }
        out.push('\n');
    }
    out
}

fn render_signal(signal: &CategorySignal) -> String {
    format!(
        "{} {} z={} pct={} confirmed={}",
        signal.category,
        signal.direction,
        fmt_value(signal.z_score, 2),
        fmt_value(signal.percentile_rank, 1),
        if signal.is_confirmed { "yes" } else { "no" }
    )
}

fn fmt_value(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| NO_VALUE.to_string(), |v| format!("{v:.precision$}"))
}

/// How often each decision occurred, per contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionCounts {
    counts: BTreeMap<Contract, BTreeMap<TradeDecision, usize>>,
}

impl DecisionCounts {
    pub fn from_rows(rows: &[NormalizedRow]) -> Self {
        let mut counts: BTreeMap<Contract, BTreeMap<TradeDecision, usize>> = BTreeMap::new();
        for row in rows {
            *counts
                .entry(row.contract)
                .or_default()
                .entry(row.trade_decision)
                .or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, contract: Contract, decision: TradeDecision) -> usize {
        self.counts
            .get(&contract)
            .and_then(|m| m.get(&decision))
            .copied()
            .unwrap_or(0)
    }

    /// Weeks with any trade recommendation.
    pub fn actionable(&self, contract: Contract) -> usize {
        TradeDecision::ALL
            .into_iter()
            .filter(|d| d.is_actionable())
            .map(|d| self.get(contract, d))
            .sum()
    }

    /// One line per contract, e.g.
    /// `ES: NO=250 YES_LONG=3 YES_SHORT=7 YES_CONFLICT=0 (actionable=10)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for contract in self.counts.keys() {
            let parts: Vec<String> = TradeDecision::ALL
                .into_iter()
                .map(|d| format!("{d}={}", self.get(*contract, d)))
                .collect();
            let _ = writeln!(
                out,
                "{contract}: {} (actionable={})",
                parts.join(" "),
                self.actionable(*contract)
            );
        }
        out
    }
}
