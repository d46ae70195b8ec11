//! Row normalization.
//!
//! Turns loosely-typed source records into canonical [`RawReportRow`]s:
//! dates are parsed, contracts resolved (inferred from the market name when
//! no code is given) and position counts coerced to numbers. Malformed rows
//! are rejected here so the metrics engine only sees well-formed input.

use chrono::{NaiveDate, NaiveDateTime};
use cot_core::{CategoryConfig, CategoryPositions, Contract, RawReportRow};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::source::SourceRecord;

/// Field names shared by every loader.
pub const REPORT_DATE_FIELD: &str = "report_date";
pub const CONTRACT_FIELD: &str = "contract";
pub const MARKET_NAME_FIELD: &str = "market_name";
pub const OPEN_INTEREST_FIELD: &str = "open_interest";

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("missing report date")]
    MissingDate,
    #[error("unparsable report date {0:?}")]
    BadDate(String),
    #[error("unrecognized contract {0:?}")]
    UnknownContract(String),
    #[error("no contract code and no market name")]
    NoContract,
}

/// Result of normalizing a batch of records.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Rows unique per (contract, report_date), ordered by contract then date.
    pub rows: Vec<RawReportRow>,
    /// Records dropped as malformed.
    pub rejected: usize,
    /// Records replaced by a later record with the same key.
    pub duplicates: usize,
}

/// Normalizer for a fixed set of tracked categories.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    categories: Vec<CategoryConfig>,
}

impl RowNormalizer {
    pub fn new(categories: &[CategoryConfig]) -> Self {
        Self {
            categories: categories.to_vec(),
        }
    }

    /// Normalize a single record.
    pub fn normalize(&self, record: &SourceRecord) -> Result<RawReportRow, RowRejection> {
        let date_text = record
            .get(REPORT_DATE_FIELD)
            .ok_or(RowRejection::MissingDate)?;
        let report_date = parse_report_date(date_text)
            .ok_or_else(|| RowRejection::BadDate(date_text.to_string()))?;

        let market_name = record.get(MARKET_NAME_FIELD).unwrap_or_default();
        let contract = match (record.get(CONTRACT_FIELD), market_name) {
            (Some(code), _) => Contract::from_code(code)
                .ok_or_else(|| RowRejection::UnknownContract(code.to_string()))?,
            (None, "") => return Err(RowRejection::NoContract),
            (None, name) => Contract::from_market_name(name)
                .ok_or_else(|| RowRejection::UnknownContract(name.to_string()))?,
        };

        let positions = self
            .categories
            .iter()
            .map(|cat| {
                let long = coerce_count(record.get(&cat.long_field));
                let short = coerce_count(record.get(&cat.short_field));
                (cat.category, CategoryPositions::new(long, short))
            })
            .collect();

        Ok(RawReportRow {
            report_date,
            contract,
            market_name: market_name.to_string(),
            open_interest: coerce_count(record.get(OPEN_INTEREST_FIELD)),
            positions,
        })
    }

    /// Normalize a batch, dropping malformed records and duplicate keys.
    ///
    /// When several records share a (contract, report_date) the last one wins.
    pub fn normalize_batch(&self, records: &[SourceRecord]) -> NormalizedBatch {
        let mut unique: BTreeMap<(Contract, NaiveDate), RawReportRow> = BTreeMap::new();
        let mut rejected = 0;
        let mut duplicates = 0;

        for record in records {
            match self.normalize(record) {
                Ok(row) => {
                    if unique.insert((row.contract, row.report_date), row).is_some() {
                        duplicates += 1;
                    }
                }
                Err(reason) => {
                    debug!(%reason, "dropping source record");
                    rejected += 1;
                }
            }
        }

        if rejected > 0 {
            warn!(rejected, total = records.len(), "dropped malformed records");
        }
        if duplicates > 0 {
            warn!(duplicates, "replaced duplicate (contract, report_date) records");
        }

        NormalizedBatch {
            rows: unique.into_values().collect(),
            rejected,
            duplicates,
        }
    }
}

/// Parse a report date.
///
/// Accepts `YYYY-MM-DD`, Socrata floating timestamps
/// (`YYYY-MM-DDTHH:MM:SS[.fff]`) and `YYYYMMDD`.
pub fn parse_report_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts.date());
        }
    }
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(text, "%Y%m%d").ok();
    }
    None
}

/// Coerce a position count.
///
/// Blank, unparsable, non-finite and negative values become `None`.
pub fn coerce_count(text: Option<&str>) -> Option<f64> {
    text?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
