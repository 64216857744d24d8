//! Early withdrawal (cash-out) pricing.
//!
//! A bet placed at `original` odds can be cashed out before the match is
//! resolved. The quote depends on how the side's odds have moved since
//! placement:
//!
//! - `current <= original` ("shortened"): the bettor gets
//!   `improvement * cap` of the original payout, where
//!   `improvement = (original - current) / original`, never more than
//!   `cap` of the original payout.
//! - `current > original` ("drifted"): the bettor gets
//!   `max(0, cap - worsening)` of the stake, where
//!   `worsening = (current - original) / original`, never more than the
//!   original payout.
//!
//! The default cap is 80%. Ratios are computed in `Decimal`.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{scaled_payout, Amount, FixedOdds};

/// Default fraction of the payout (or stake) a cash-out can return.
pub const DEFAULT_CASH_OUT_CAP: Decimal = dec!(0.8);

/// Direction the side's odds moved between placement and the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OddsMove {
    /// `current <= original`.
    Shortened,
    /// `current > original`.
    Drifted,
}

/// A priced cash-out for one bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalQuote {
    /// `floor(stake * original / 1e18)`.
    pub original_payout: u128,
    /// `floor(stake * current / 1e18)`.
    pub current_payout: u128,
    pub direction: OddsMove,
    /// Amount paid to the bettor.
    pub value: u128,
}

/// Prices early withdrawals against a current odds snapshot.
#[derive(Debug, Clone)]
pub struct WithdrawalPricer {
    cap: Decimal,
}

impl Default for WithdrawalPricer {
    fn default() -> Self {
        Self::new(DEFAULT_CASH_OUT_CAP)
    }
}

impl WithdrawalPricer {
    pub fn new(cap: Decimal) -> Self {
        Self {
            cap: cap.max(Decimal::ZERO),
        }
    }

    pub fn cap(&self) -> Decimal {
        self.cap
    }

    /// Quote a cash-out. `None` when `original_odds` is zero (the bet was
    /// placed into an undefined market).
    pub fn price(
        &self,
        bet_amount: Amount,
        original_odds: FixedOdds,
        current_odds: FixedOdds,
    ) -> Option<WithdrawalQuote> {
        if original_odds == 0 {
            return None;
        }

        let original_payout = scaled_payout(bet_amount, original_odds);
        let current_payout = scaled_payout(bet_amount, current_odds);

        let (direction, value) = if current_odds <= original_odds {
            let improvement = odds_ratio(original_odds - current_odds, original_odds);
            let pct = improvement.checked_mul(self.cap)?.min(self.cap);
            let payout = Decimal::from_u128(original_payout)?;
            let offered = floor_u128(payout.checked_mul(pct)?)?;
            let ceiling = floor_u128(payout.checked_mul(self.cap)?)?;
            (OddsMove::Shortened, offered.min(ceiling))
        } else {
            let worsening = odds_ratio(current_odds - original_odds, original_odds);
            let pct = self.cap.saturating_sub(worsening).max(Decimal::ZERO);
            let offered = floor_u128(Decimal::from(bet_amount).checked_mul(pct)?)?;
            (OddsMove::Drifted, offered.min(original_payout))
        };

        trace!(
            bet_amount,
            original_payout,
            current_payout,
            ?direction,
            value,
            "Withdrawal priced"
        );

        Some(WithdrawalQuote {
            original_payout,
            current_payout,
            direction,
            value,
        })
    }
}

/// `numerator / denominator` for fixed-point odds values.
///
/// `Decimal` holds at most 96 bits, so both operands are shifted right
/// together until the larger fits. The ratio keeps 96 significant bits.
/// Saturates at `Decimal::MAX` when the ratio itself is out of range.
fn odds_ratio(numerator: u128, denominator: u128) -> Decimal {
    let bits = 128 - numerator.max(denominator).leading_zeros();
    let shift = bits.saturating_sub(DECIMAL_MANTISSA_BITS);
    let den = denominator >> shift;
    if den == 0 {
        return Decimal::MAX;
    }
    // Both fit in 96 bits after the shift.
    let num = Decimal::from_i128_with_scale((numerator >> shift) as i128, 0);
    num.checked_div(Decimal::from_i128_with_scale(den as i128, 0))
        .unwrap_or(Decimal::MAX)
}

const DECIMAL_MANTISSA_BITS: u32 = 96;

fn floor_u128(value: Decimal) -> Option<u128> {
    value.floor().to_u128()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
