//! Trade decision from the two opposing confirmed crowding flags.

use cot_core::TradeDecision;

/// Combine confirmations into a decision.
///
/// `fade_long_confirmed` is the confirmed long-crowding of the category we
/// fade on the long side (Asset Managers by default), which argues for a
/// short. `fade_short_confirmed` is the confirmed short-crowding of the
/// opposing category (Leveraged Funds by default), which argues for a long.
#[inline]
pub fn decide(fade_long_confirmed: bool, fade_short_confirmed: bool) -> TradeDecision {
    match (fade_long_confirmed, fade_short_confirmed) {
        (false, false) => TradeDecision::No,
        (false, true) => TradeDecision::YesLong,
        (true, false) => TradeDecision::YesShort,
        (true, true) => TradeDecision::YesConflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(false, false), TradeDecision::No);
        assert_eq!(decide(false, true), TradeDecision::YesLong);
        assert_eq!(decide(true, false), TradeDecision::YesShort);
        assert_eq!(decide(true, true), TradeDecision::YesConflict);
    }

    #[test]
    fn test_table_is_a_bijection() {
        let mut seen = Vec::new();
        for am in [false, true] {
            for lf in [false, true] {
                seen.push(decide(am, lf));
            }
        }
        for decision in TradeDecision::ALL {
            assert_eq!(seen.iter().filter(|&&d| d == decision).count(), 1);
        }
    }
}
