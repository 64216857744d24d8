//! The match book: pool totals, plus the individual bets when the book is
//! tracked.

use crate::market::OddsEngine;
use crate::types::{Amount, Bet, BookMode, Pool, Side, ODDS_SCALE};

/// Pool totals and (in tracked mode) the active bets on each side.
#[derive(Debug, Clone)]
pub struct Book {
    mode: BookMode,
    pool: Pool,
    opening_liquidity: Amount,
    bets_a: Vec<Bet>,
    bets_b: Vec<Bet>,
}

impl Book {
    pub fn new(mode: BookMode) -> Self {
        Self {
            mode,
            pool: Pool::default(),
            opening_liquidity: 0,
            bets_a: Vec::new(),
            bets_b: Vec::new(),
        }
    }

    /// A book whose pools start with `per_side` on both sides. The seed
    /// stake is not a bet and never pays out.
    pub fn with_opening_liquidity(mode: BookMode, per_side: Amount) -> Self {
        Self {
            pool: Pool::new(per_side, per_side),
            opening_liquidity: per_side,
            ..Self::new(mode)
        }
    }

    pub fn mode(&self) -> BookMode {
        self.mode
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn opening_liquidity(&self) -> Amount {
        self.opening_liquidity
    }

    /// Whether individual bets are retained.
    pub fn tracks_bets(&self) -> bool {
        self.mode == BookMode::Tracked
    }

    /// Active bets on one side (always empty for an aggregate book).
    pub fn bets(&self, side: Side) -> &[Bet] {
        match side {
            Side::A => &self.bets_a,
            Side::B => &self.bets_b,
        }
    }

    /// Number of active bets across both sides.
    pub fn active_bets(&self) -> usize {
        self.bets_a.len() + self.bets_b.len()
    }

    /// Add a bet to its side's pool (and list, when tracked).
    pub fn record(&mut self, bet: Bet) {
        self.pool.add(bet.side, bet.amount);
        if self.tracks_bets() {
            match bet.side {
                Side::A => self.bets_a.push(bet),
                Side::B => self.bets_b.push(bet),
            }
        }
    }

    /// Remove every bet on `side` for which `cash_out` returns a value,
    /// taking its stake out of the pool. Returns `(count, total value)`.
    ///
    /// Bets are visited in placement order.
    pub fn withdraw_where<F>(&mut self, side: Side, mut cash_out: F) -> (usize, u128)
    where
        F: FnMut(&Bet) -> Option<u128>,
    {
        let Book {
            pool,
            bets_a,
            bets_b,
            ..
        } = self;
        let bets = match side {
            Side::A => bets_a,
            Side::B => bets_b,
        };

        let mut count = 0usize;
        let mut total = 0u128;
        bets.retain(|bet| match cash_out(bet) {
            Some(value) => {
                pool.remove(side, bet.amount);
                count += 1;
                total += value;
                false
            }
            None => true,
        });
        (count, total)
    }

    /// What the operator owes if `winner` wins.
    ///
    /// Tracked: each winning bet at the odds it was placed at.
    /// Aggregate: the winning side's total at final odds, times
    /// `payout_percentage / 100`.
    pub fn payout_for(&self, winner: Side, odds: &OddsEngine, payout_percentage: u32) -> u128 {
        match self.mode {
            BookMode::Tracked => self
                .bets(winner)
                .iter()
                .fold(0u128, |acc, bet| acc.saturating_add(bet.payout())),
            BookMode::Aggregate => {
                let final_odds = odds.compute(&self.pool).for_side(winner);
                u128::from(self.pool.side_total(winner))
                    .saturating_mul(final_odds)
                    .saturating_mul(u128::from(payout_percentage))
                    / (100 * ODDS_SCALE)
            }
        }
    }

    /// Pool totals equal opening liquidity plus the active stakes.
    /// Always true for an aggregate book, which keeps no bet list.
    pub fn is_consistent(&self) -> bool {
        if !self.tracks_bets() {
            return true;
        }
        Side::ALL.iter().all(|&side| {
            let active: u128 = self.bets(side).iter().map(|b| u128::from(b.amount)).sum();
            u128::from(self.pool.side_total(side)) == u128::from(self.opening_liquidity) + active
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
