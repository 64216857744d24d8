//! Market pricing: randomized bet flow, pari-mutuel odds, and early
//! withdrawal (cash-out) quotes.
//!
//! Everything here is pure arithmetic over pool totals and fixed-point
//! odds; randomness is drawn through [`random::UniformSource`].

pub mod bets;
pub mod odds;
pub mod random;
pub mod withdrawal;

pub use bets::BetGenerator;
pub use odds::{compute_odds, OddsEngine};
pub use random::{derive_seed, SeededSource, UniformSource};
pub use withdrawal::{OddsMove, WithdrawalPricer, WithdrawalQuote};
