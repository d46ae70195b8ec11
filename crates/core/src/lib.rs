//! Core types and configuration for the crowded-cot system.
//!
//! This crate provides shared types used across all other crates:
//! - Contracts, trader categories and crowding directions
//! - Raw weekly report rows and normalized signal rows
//! - Configuration structures and validation
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{CategoryConfig, Config, DecisionPolicy, SignalConfig, SourceConfig};
pub use error::{Error, Result};
pub use types::*;
