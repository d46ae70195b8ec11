//! Data ingestion and normalization for the crowded-cot system.
//!
//! This crate handles:
//! - Loading TFF rows from local CSV files
//! - Fetching TFF rows from the CFTC public reporting API
//! - Coercing loosely-typed source records into canonical report rows
//! - Contract inference from market names

pub mod source;
pub mod normalizer;
pub mod csv_loader;
pub mod cftc;

pub use source::{DataSource, SourceRecord};
pub use normalizer::{NormalizedBatch, RowNormalizer, RowRejection};
pub use csv_loader::CsvLoader;
pub use cftc::{CftcClient, CftcQuery};
