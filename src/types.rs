//! Shared types for the pari-mutuel simulator.
//!
//! Value objects (bets, pool totals, odds pairs, run reports) used by the
//! market pricing modules, the match engine, and the Monte Carlo driver.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Fixed-point scales
// ---------------------------------------------------------------------------

/// Decimal odds are stored as integers scaled by 1e18 (2.0 → 2e18).
pub const ODDS_SCALE: u128 = 1_000_000_000_000_000_000;

/// Scale of the implied probability (1000 = 100%, 1025 = 102.5%).
pub const PROBABILITY_SCALE: u128 = 1_000;

/// Currency in the smallest unit. Bet stakes and pool totals.
pub type Amount = u64;

/// Signed currency, used where balances can go negative (uncovered payouts).
pub type SignedAmount = i128;

/// Fixed-point decimal odds (scale [`ODDS_SCALE`]). Zero means "undefined".
pub type FixedOdds = u128;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// The two outcomes of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides in settlement order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet
// ---------------------------------------------------------------------------

/// A single recorded wager. Immutable once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub amount: Amount,
    pub side: Side,
    /// Odds on `side` as they stood just before this bet joined the pool.
    pub odds: FixedOdds,
}

impl Bet {
    pub fn new(amount: Amount, side: Side, odds: FixedOdds) -> Self {
        Self { amount, side, odds }
    }

    /// Amount owed to the bettor if `side` wins: `floor(amount * odds / 1e18)`.
    pub fn payout(&self) -> u128 {
        scaled_payout(self.amount, self.odds)
    }
}

/// `floor(amount * odds / 1e18)`, saturating instead of overflowing.
pub fn scaled_payout(amount: Amount, odds: FixedOdds) -> u128 {
    u128::from(amount).saturating_mul(odds) / ODDS_SCALE
}

/// Lossless-or-saturating widening used when unsigned totals meet the balance.
pub fn to_signed(value: u128) -> SignedAmount {
    SignedAmount::try_from(value).unwrap_or(SignedAmount::MAX)
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Aggregate stake per side for one match.
///
/// Owned by a single book; totals move only through [`Pool::add`] and
/// [`Pool::remove`] so they always equal the active stakes on each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub total_a: Amount,
    pub total_b: Amount,
}

impl Pool {
    pub fn new(total_a: Amount, total_b: Amount) -> Self {
        Self { total_a, total_b }
    }

    /// Total stake on one side.
    pub fn side_total(&self, side: Side) -> Amount {
        match side {
            Side::A => self.total_a,
            Side::B => self.total_b,
        }
    }

    /// Combined volume of both sides.
    pub fn volume(&self) -> u128 {
        u128::from(self.total_a) + u128::from(self.total_b)
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Add stake to a side.
    pub fn add(&mut self, side: Side, amount: Amount) {
        let total = self.side_total_mut(side);
        *total = total.saturating_add(amount);
    }

    /// Remove stake from a side (withdrawals). Never goes below zero.
    pub fn remove(&mut self, side: Side, amount: Amount) {
        let total = self.side_total_mut(side);
        *total = total.saturating_sub(amount);
    }

    fn side_total_mut(&mut self, side: Side) -> &mut Amount {
        match side {
            Side::A => &mut self.total_a,
            Side::B => &mut self.total_b,
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A={} B={}", self.total_a, self.total_b)
    }
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// Odds snapshot for both sides. A zero entry means the side has no share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    pub a: FixedOdds,
    pub b: FixedOdds,
}

impl Odds {
    /// Both sides undefined (empty market).
    pub const UNDEFINED: Odds = Odds { a: 0, b: 0 };

    pub fn new(a: FixedOdds, b: FixedOdds) -> Self {
        Self { a, b }
    }

    pub fn for_side(&self, side: Side) -> FixedOdds {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Whether odds are defined for a side.
    pub fn is_defined(&self, side: Side) -> bool {
        self.for_side(side) > 0
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A={:.4} B={:.4}",
            self.a as f64 / ODDS_SCALE as f64,
            self.b as f64 / ODDS_SCALE as f64,
        )
    }
}

// ---------------------------------------------------------------------------
// Book mode
// ---------------------------------------------------------------------------

/// How the engine keeps its book for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookMode {
    /// Pool totals only. Payout from final odds with a flat take.
    Aggregate,
    /// Every bet retained with its placement odds; early withdrawals enabled.
    Tracked,
}

impl fmt::Display for BookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookMode::Aggregate => write!(f, "aggregate"),
            BookMode::Tracked => write!(f, "tracked"),
        }
    }
}

impl std::str::FromStr for BookMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggregate" | "simple" => Ok(BookMode::Aggregate),
            "tracked" | "withdrawal" | "withdrawals" => Ok(BookMode::Tracked),
            other => Err(SimError::InvalidParameter(format!("unknown book mode: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Match report
// ---------------------------------------------------------------------------

/// Outcome of one simulated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub mode: BookMode,
    pub winner: Side,
    pub bets_placed: usize,
    pub withdrawals: usize,
    /// Stakes received from bettors.
    pub stake_inflow: u128,
    /// Cash-out value paid for early withdrawals.
    pub withdrawal_outflow: u128,
    pub payout: u128,
    /// Drawn from the capped facility during settlement.
    pub facility_borrowed: u128,
    /// Balance after payout, before any repayment correction.
    pub closing_balance: SignedAmount,
    /// Pool volume when the match settled.
    pub pool_volume: u128,
    pub profit: SignedAmount,
    pub profit_percentage: f64,
    /// Outstanding debt as reported (zero once repaid).
    pub borrowed_amount: u128,
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] winner={} bets={} withdrawals={} payout={} profit={:.2}% borrowed={}",
            self.mode,
            self.winner,
            self.bets_placed,
            self.withdrawals,
            self.payout,
            self.profit_percentage,
            self.borrowed_amount,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid match transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Simulation interrupted: {0}")]
    Interrupted(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
