//! Pari-mutuel odds from the pool split.
//!
//! A side's implied share is `total_side * P / volume` where `P` is the
//! implied probability (1000 = 100%, anything above is the overround).
//! Odds are the inverse of that share in 1e18 fixed point:
//! `odds = floor(1e18 * 1000 / share)`. An empty pool or an empty side
//! yields the 0 sentinel.

use crate::types::{Amount, FixedOdds, Odds, Pool, ODDS_SCALE, PROBABILITY_SCALE};

/// `1e18 * 1000`: the numerator of every odds quotient.
const ODDS_NUMERATOR: u128 = ODDS_SCALE * PROBABILITY_SCALE;

/// Prices a pool at a fixed implied probability.
#[derive(Debug, Clone, Copy)]
pub struct OddsEngine {
    implied_probability: u32,
}

impl OddsEngine {
    pub fn new(implied_probability: u32) -> Self {
        Self { implied_probability }
    }

    pub fn implied_probability(&self) -> u32 {
        self.implied_probability
    }

    /// Current odds for both sides of `pool`.
    pub fn compute(&self, pool: &Pool) -> Odds {
        compute_odds(pool, self.implied_probability)
    }
}

/// Odds for both sides, `(0, 0)` when the pool is empty.
pub fn compute_odds(pool: &Pool, implied_probability: u32) -> Odds {
    let volume = pool.volume();
    if volume == 0 {
        return Odds::UNDEFINED;
    }
    Odds::new(
        side_odds(pool.total_a, volume, implied_probability),
        side_odds(pool.total_b, volume, implied_probability),
    )
}

/// `floor(1e21 / (side * P / volume))`, evaluated as
/// `floor(1e21 * volume / (side * P))` so the share is never truncated.
fn side_odds(side_total: Amount, volume: u128, implied_probability: u32) -> FixedOdds {
    let weighted = u128::from(side_total) * u128::from(implied_probability);
    if weighted == 0 {
        return 0;
    }
    match ODDS_NUMERATOR.checked_mul(volume) {
        Some(numerator) => numerator / weighted,
        // Volumes above ~3.4e17 units: fall back to an integer share.
        None => match weighted / volume {
            0 => 0,
            share => ODDS_NUMERATOR / share,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
