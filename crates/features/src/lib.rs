//! Positioning metrics for the crowded-cot system.
//!
//! This crate handles:
//! - Net position as percent of open interest
//! - Rolling mean, sample standard deviation, z-score and percentile rank
//! - Crowding classification against percentile/z-score thresholds
//! - Multi-week confirmation and the trade decision
//! - The per-contract pipeline tying these together

pub mod net_position;
pub mod rolling;
pub mod classifier;
pub mod confirmation;
pub mod decision;
pub mod engine;

pub use net_position::net_pct_oi;
pub use rolling::{rolling_statistics, RollingPoint, RollingStats};
pub use classifier::CrowdingThresholds;
pub use confirmation::{confirm_flags, ConfirmationTracker};
pub use decision::decide;
pub use engine::{ContractAccumulator, SignalEngine};
