//! N-week confirmation of extreme flags.
//!
//! A flag is confirmed at row `i` iff it is set on each of the `confirm_weeks`
//! consecutive rows ending at `i`. Until that many rows exist the result is
//! `false`.

use std::collections::VecDeque;

/// Trailing-window confirmation state for one category/direction flag.
#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    /// Required consecutive weeks.
    confirm_weeks: usize,
    /// Most recent flags, oldest first.
    flags: VecDeque<bool>,
}

impl ConfirmationTracker {
    /// Create a tracker. `confirm_weeks` below 1 is treated as 1.
    pub fn new(confirm_weeks: usize) -> Self {
        let confirm_weeks = confirm_weeks.max(1);
        Self {
            confirm_weeks,
            flags: VecDeque::with_capacity(confirm_weeks),
        }
    }

    /// Append this week's flag and return whether it is confirmed.
    pub fn push(&mut self, flag: bool) -> bool {
        if self.flags.len() >= self.confirm_weeks {
            self.flags.pop_front();
        }
        self.flags.push_back(flag);
        self.is_confirmed()
    }

    /// Whether the full window is present and every flag in it is set.
    pub fn is_confirmed(&self) -> bool {
        self.flags.len() == self.confirm_weeks && self.flags.iter().all(|&f| f)
    }
}

/// Confirmation for every row of a chronologically ordered flag series.
pub fn confirm_flags(flags: &[bool], confirm_weeks: usize) -> Vec<bool> {
    let mut tracker = ConfirmationTracker::new(confirm_weeks);
    flags.iter().map(|&f| tracker.push(f)).collect()
}
