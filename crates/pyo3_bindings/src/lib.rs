//! PyO3 bindings for the crowded-cot signal engine.
//!
//! Exposes the Rust core to Python:
//! - Report rows and signal configuration
//! - Per-category signals and output rows
//! - The per-contract signal engine

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use chrono::NaiveDate;
use cot_core::{
    CategorySignal as RustCategorySignal, Config as RustConfig, Contract,
    NormalizedRow as RustNormalizedRow, RawReportRow as RustRawReportRow,
    SignalConfig as RustSignalConfig, TraderCategory,
};
use cot_features::SignalEngine as RustSignalEngine;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_category(code: &str) -> PyResult<TraderCategory> {
    TraderCategory::from_code(code).ok_or_else(|| value_error(format!("unknown category {code:?}")))
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One contract, one report week.
#[pyclass]
#[derive(Clone)]
pub struct RawReportRow {
    inner: RustRawReportRow,
}

#[pymethods]
impl RawReportRow {
    /// `report_date` is `YYYY-MM-DD`; `contract` is "ES" or "NQ".
    #[new]
    #[pyo3(signature = (report_date, contract, open_interest=None, market_name=String::new()))]
    fn new(
        report_date: &str,
        contract: &str,
        open_interest: Option<f64>,
        market_name: String,
    ) -> PyResult<Self> {
        let date = NaiveDate::parse_from_str(report_date, "%Y-%m-%d").map_err(value_error)?;
        let contract = Contract::from_code(contract)
            .ok_or_else(|| value_error(format!("unknown contract {contract:?}")))?;

        let mut inner = RustRawReportRow::new(date, contract, open_interest);
        inner.market_name = market_name;
        Ok(RawReportRow { inner })
    }

    /// Set long/short counts for a category code ("AM", "LF", ...).
    #[pyo3(signature = (category, long=None, short=None))]
    fn set_positions(&mut self, category: &str, long: Option<f64>, short: Option<f64>) -> PyResult<()> {
        let category = parse_category(category)?;
        self.inner = self.inner.clone().with_positions(category, long, short);
        Ok(())
    }

    #[getter]
    fn report_date(&self) -> String {
        self.inner.report_date.to_string()
    }

    #[getter]
    fn contract(&self) -> &'static str {
        self.inner.contract.code()
    }

    #[getter]
    fn open_interest(&self) -> Option<f64> {
        self.inner.open_interest
    }

    fn __repr__(&self) -> String {
        format!(
            "RawReportRow(report_date={}, contract={}, open_interest={:?})",
            self.inner.report_date, self.inner.contract, self.inner.open_interest
        )
    }
}

/// Rolling window and threshold parameters.
#[pyclass]
#[derive(Clone)]
pub struct SignalConfig {
    #[pyo3(get, set)]
    pub lookback_weeks: usize,
    #[pyo3(get, set)]
    pub min_required_weeks: usize,
    #[pyo3(get, set)]
    pub extreme_z_threshold: f64,
    #[pyo3(get, set)]
    pub long_crowded_percentile: f64,
    #[pyo3(get, set)]
    pub short_crowded_percentile: f64,
    #[pyo3(get, set)]
    pub confirm_weeks: usize,
}

#[pymethods]
impl SignalConfig {
    #[new]
    fn new() -> Self {
        RustSignalConfig::default().into()
    }

    /// Raise `ValueError` if the parameters are inconsistent.
    fn validate(&self) -> PyResult<()> {
        RustSignalConfig::from(self.clone()).validate().map_err(value_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "SignalConfig(lookback_weeks={}, min_required_weeks={}, extreme_z_threshold={}, \
             long_crowded_percentile={}, short_crowded_percentile={}, confirm_weeks={})",
            self.lookback_weeks,
            self.min_required_weeks,
            self.extreme_z_threshold,
            self.long_crowded_percentile,
            self.short_crowded_percentile,
            self.confirm_weeks
        )
    }
}

impl From<RustSignalConfig> for SignalConfig {
    fn from(c: RustSignalConfig) -> Self {
        SignalConfig {
            lookback_weeks: c.lookback_weeks,
            min_required_weeks: c.min_required_weeks,
            extreme_z_threshold: c.extreme_z_threshold,
            long_crowded_percentile: c.long_crowded_percentile,
            short_crowded_percentile: c.short_crowded_percentile,
            confirm_weeks: c.confirm_weeks,
        }
    }
}

impl From<SignalConfig> for RustSignalConfig {
    fn from(c: SignalConfig) -> Self {
        RustSignalConfig {
            lookback_weeks: c.lookback_weeks,
            min_required_weeks: c.min_required_weeks,
            extreme_z_threshold: c.extreme_z_threshold,
            long_crowded_percentile: c.long_crowded_percentile,
            short_crowded_percentile: c.short_crowded_percentile,
            confirm_weeks: c.confirm_weeks,
        }
    }
}

/// Derived metrics for one category in one week.
#[pyclass]
#[derive(Clone)]
pub struct CategorySignal {
    #[pyo3(get)]
    pub category: &'static str,
    #[pyo3(get)]
    pub direction: &'static str,
    #[pyo3(get)]
    pub long: Option<f64>,
    #[pyo3(get)]
    pub short: Option<f64>,
    #[pyo3(get)]
    pub net: Option<f64>,
    #[pyo3(get)]
    pub net_pct_oi: Option<f64>,
    #[pyo3(get)]
    pub z_score: Option<f64>,
    #[pyo3(get)]
    pub percentile_rank: Option<f64>,
    #[pyo3(get)]
    pub is_extreme: bool,
    #[pyo3(get)]
    pub is_confirmed: bool,
}

#[pymethods]
impl CategorySignal {
    fn __repr__(&self) -> String {
        format!(
            "CategorySignal(category={}, direction={}, z_score={:?}, percentile_rank={:?}, is_confirmed={})",
            self.category, self.direction, self.z_score, self.percentile_rank, self.is_confirmed
        )
    }
}

impl From<&RustCategorySignal> for CategorySignal {
    fn from(s: &RustCategorySignal) -> Self {
        CategorySignal {
            category: s.category.code(),
            direction: s.direction.as_str(),
            long: s.long,
            short: s.short,
            net: s.net,
            net_pct_oi: s.net_pct_oi,
            z_score: s.z_score,
            percentile_rank: s.percentile_rank,
            is_extreme: s.is_extreme,
            is_confirmed: s.is_confirmed,
        }
    }
}

/// One output row.
#[pyclass]
#[derive(Clone)]
pub struct SignalRow {
    #[pyo3(get)]
    pub report_date: String,
    #[pyo3(get)]
    pub contract: &'static str,
    #[pyo3(get)]
    pub market_name: String,
    #[pyo3(get)]
    pub open_interest: Option<f64>,
    #[pyo3(get)]
    pub categories: Vec<CategorySignal>,
    #[pyo3(get)]
    pub extreme_crowding: bool,
    #[pyo3(get)]
    pub trade_decision: &'static str,
}

#[pymethods]
impl SignalRow {
    /// Signal for a category code, if tracked.
    fn category(&self, code: &str) -> Option<CategorySignal> {
        self.categories
            .iter()
            .find(|s| s.category.eq_ignore_ascii_case(code))
            .cloned()
    }

    fn __repr__(&self) -> String {
        format!(
            "SignalRow(report_date={}, contract={}, trade_decision={})",
            self.report_date, self.contract, self.trade_decision
        )
    }
}

impl From<RustNormalizedRow> for SignalRow {
    fn from(r: RustNormalizedRow) -> Self {
        SignalRow {
            report_date: r.report_date.to_string(),
            contract: r.contract.code(),
            market_name: r.market_name,
            open_interest: r.open_interest,
            categories: r.categories.iter().map(Into::into).collect(),
            extreme_crowding: r.extreme_crowding,
            trade_decision: r.trade_decision.as_str(),
        }
    }
}

// ============================================================================
// Engine Wrapper
// ============================================================================

/// Crowded-positioning signal engine with the default AM/LF categories.
#[pyclass]
pub struct SignalEngine {
    inner: RustSignalEngine,
}

#[pymethods]
impl SignalEngine {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<SignalConfig>) -> PyResult<Self> {
        let mut rust_config = RustConfig::default();
        if let Some(c) = config {
            rust_config.signal = c.into();
        }
        let inner = RustSignalEngine::new(&rust_config).map_err(value_error)?;
        Ok(SignalEngine { inner })
    }

    /// Compute signal rows, ordered by contract then report date.
    fn compute(&self, rows: Vec<RawReportRow>) -> Vec<SignalRow> {
        let rust_rows: Vec<RustRawReportRow> = rows.into_iter().map(|r| r.inner).collect();
        self.inner
            .compute(&rust_rows)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Active signal configuration.
    #[getter]
    fn config(&self) -> SignalConfig {
        self.inner.signal_config().clone().into()
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Crowded COT core - Rust signal engine for Python.
#[pymodule]
fn crowded_cot_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<RawReportRow>()?;
    m.add_class::<SignalConfig>()?;
    m.add_class::<CategorySignal>()?;
    m.add_class::<SignalRow>()?;

    // Engine
    m.add_class::<SignalEngine>()?;

    Ok(())
}
