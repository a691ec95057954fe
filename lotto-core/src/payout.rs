use crate::error::{LotteryError, Result};
use crate::numbers::PICK_COUNT;
use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// Multiplier applied to the stake for a given match count.
pub fn multiplier(match_count: usize) -> u64 {
    match match_count {
        6 => 1000,
        5 => 100,
        4 => 10,
        3 => 2,
        _ => 0,
    }
}

/// Result descriptor written onto a bet at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetResult {
    pub match_count: usize,
    pub narrative: String,
}

impl BetResult {
    pub fn new(match_count: usize) -> Self {
        let narrative = if match_count == PICK_COUNT {
            format!("JACKPOT! Matched all {} numbers!", PICK_COUNT)
        } else {
            format!("Matched {} numbers.", match_count)
        };
        Self {
            match_count,
            narrative,
        }
    }

    /// A winning bet whose payout could not be credited. It settles as lost.
    pub fn unpaid(match_count: usize, reason: &LotteryError) -> Self {
        Self {
            match_count,
            narrative: format!(
                "Matched {} numbers. Winnings could not be paid: {}",
                match_count, reason
            ),
        }
    }

    pub fn is_jackpot(&self) -> bool {
        self.match_count == PICK_COUNT
    }
}

/// Winnings for `stake` at `match_count`; zero for fewer than three matches.
pub fn payout(stake: Amount, match_count: usize) -> Result<Amount> {
    stake
        .checked_mul(multiplier(match_count))
        .ok_or_else(|| LotteryError::invalid_amount(format!("payout on {} overflows", stake)))
}
