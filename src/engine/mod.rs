//! Core engine: one simulated match from first bet to settlement.

pub mod book;
pub mod match_engine;
pub mod state;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market::bets::DEFAULT_SKEW_POWER;
use crate::market::withdrawal::DEFAULT_CASH_OUT_CAP;
use crate::types::{Amount, BookMode};

pub use book::Book;
pub use match_engine::MatchEngine;
pub use state::MatchState;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parameters of a single match run. Built by the caller; the engine
/// never reads ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub mode: BookMode,
    pub initial_balance: Amount,
    pub num_bettors: usize,
    pub max_bet_amount: Amount,
    /// 1000 = 100%.
    pub implied_probability: u32,
    /// Facility cap as a percentage of the initial balance.
    pub borrow_limit_percentage: Decimal,
    /// Share of the aggregate payout actually paid (95 = 5% take).
    pub payout_percentage: u32,
    /// Chance each active bet is cashed out (tracked mode).
    pub withdrawal_probability: f64,
    /// Cash-out cap as a fraction (tracked mode).
    pub cash_out_cap: Decimal,
    /// Seed stake on each side before bettors arrive (tracked mode).
    pub opening_liquidity: Amount,
    /// Bet-size skew exponent.
    pub skew_power: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: BookMode::Aggregate,
            initial_balance: 1_000_000,
            num_bettors: 1_000,
            max_bet_amount: 1_000,
            implied_probability: 1_025,   // 102.5%
            borrow_limit_percentage: dec!(1),
            payout_percentage: 95,
            withdrawal_probability: 0.4,
            cash_out_cap: DEFAULT_CASH_OUT_CAP,
            opening_liquidity: 0,
            skew_power: DEFAULT_SKEW_POWER,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where a match is in its single pass. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Created,
    BetsPlaced,
    WithdrawalsApplied,
    Resolved,
    Settled,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPhase::Created => write!(f, "Created"),
            MatchPhase::BetsPlaced => write!(f, "BetsPlaced"),
            MatchPhase::WithdrawalsApplied => write!(f, "WithdrawalsApplied"),
            MatchPhase::Resolved => write!(f, "Resolved"),
            MatchPhase::Settled => write!(f, "Settled"),
        }
    }
}
