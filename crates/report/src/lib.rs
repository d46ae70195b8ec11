//! Reporting and export for the crowded-cot system.
//!
//! This crate provides:
//! - The tidy column model shared by every output format
//! - CSV and JSON writers
//! - Latest-week selection and the console summary
//! - Per-contract decision counts

pub mod export;
pub mod summary;

pub use export::{write_csv, write_json, Cell, TableLayout};
pub use summary::{latest_rows, render_summary, DecisionCounts};
