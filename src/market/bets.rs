//! Synthetic bettor flow.
//!
//! Bet sizes are skewed toward the maximum: with `u` uniform in `[0, 1)`
//! the stake is `trunc((1 - u^power) * max) + 1`, so `power = 2` produces
//! many near-max wagers. Sides are a fair coin.

use super::random::UniformSource;
use crate::types::{Amount, Side};

/// Default skew exponent for bet sizes.
pub const DEFAULT_SKEW_POWER: i32 = 2;

/// Draws bet sizes and sides for synthetic bettors.
#[derive(Debug, Clone)]
pub struct BetGenerator {
    max_bet_amount: Amount,
    power: i32,
}

impl BetGenerator {
    pub fn new(max_bet_amount: Amount, power: i32) -> Self {
        Self {
            max_bet_amount: max_bet_amount.max(1),
            power: power.max(1),
        }
    }

    pub fn max_bet_amount(&self) -> Amount {
        self.max_bet_amount
    }

    pub fn power(&self) -> i32 {
        self.power
    }

    /// Next stake, in `[1, max_bet_amount]`.
    pub fn next_bet_amount<R: UniformSource + ?Sized>(&self, rng: &mut R) -> Amount {
        skewed_amount(rng.next_unit(), self.max_bet_amount, self.power)
    }

    /// Next side, A or B with equal probability.
    pub fn next_side<R: UniformSource + ?Sized>(&self, rng: &mut R) -> Side {
        coin_flip(rng)
    }
}

/// Uniformly random side.
pub fn coin_flip<R: UniformSource + ?Sized>(rng: &mut R) -> Side {
    if rng.next_unit() < 0.5 {
        Side::A
    } else {
        Side::B
    }
}

/// Map a uniform draw to a skewed stake in `[1, max_bet_amount]`.
///
/// `u == 0` would give `max + 1`; the result is clamped to the maximum.
pub fn skewed_amount(u: f64, max_bet_amount: Amount, power: i32) -> Amount {
    let max_bet_amount = max_bet_amount.max(1);
    let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
    let weight = 1.0 - u.powi(power.max(1));
    // `as` truncates toward zero and saturates
    let scaled = (weight * max_bet_amount as f64) as Amount;
    scaled.saturating_add(1).min(max_bet_amount)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::random::{MockUniformSource, SeededSource};
    use proptest::prelude::*;

    #[test]
    fn test_skewed_amount_midpoint() {
        // 1 - 0.25 = 0.75 → 750 + 1
        assert_eq!(skewed_amount(0.5, 1000, 2), 751);
    }

    #[test]
    fn test_skewed_amount_zero_draw_clamped() {
        assert_eq!(skewed_amount(0.0, 1000, 2), 1000);
    }

    #[test]
    fn test_skewed_amount_near_one_draw() {
        assert_eq!(skewed_amount(0.999_999_9, 1000, 2), 1);
    }

    #[test]
    fn test_skewed_amount_linear_power() {
        // power 1 → uniform: 1 - 0.9 = 0.1 → 100 + 1 (float noise truncates to 99 or 100)
        let amount = skewed_amount(0.9, 1000, 1);
        assert!((100..=101).contains(&amount), "got {amount}");
    }

    #[test]
    fn test_skewed_amount_unit_max() {
        assert_eq!(skewed_amount(0.3, 1, 2), 1);
        assert_eq!(skewed_amount(0.3, 0, 2), 1);
    }

    #[test]
    fn test_generator_uses_source() {
        let mut rng = MockUniformSource::new();
        rng.expect_next_unit().times(1).return_const(0.5);
        let generator = BetGenerator::new(1000, DEFAULT_SKEW_POWER);
        assert_eq!(generator.next_bet_amount(&mut rng), 751);
    }

    #[test]
    fn test_next_side_split() {
        let mut rng = MockUniformSource::new();
        let mut draws = vec![0.49, 0.5].into_iter();
        rng.expect_next_unit()
            .times(2)
            .returning(move || draws.next().unwrap_or(0.0));
        let generator = BetGenerator::new(10, 2);
        assert_eq!(generator.next_side(&mut rng), Side::A);
        assert_eq!(generator.next_side(&mut rng), Side::B);
    }

    #[test]
    fn test_amounts_skew_toward_max() {
        let generator = BetGenerator::new(1000, DEFAULT_SKEW_POWER);
        let mut rng = SeededSource::new(11);
        let n = 20_000;
        let mean = (0..n)
            .map(|_| generator.next_bet_amount(&mut rng) as f64)
            .sum::<f64>()
            / n as f64;
        // E[1 - u^2] = 2/3
        assert!((mean - 667.0).abs() < 15.0, "mean {mean}");
    }

    #[test]
    fn test_sides_roughly_balanced() {
        let generator = BetGenerator::new(10, 2);
        let mut rng = SeededSource::new(3);
        let a = (0..10_000)
            .filter(|_| generator.next_side(&mut rng) == Side::A)
            .count();
        assert!((4_700..=5_300).contains(&a), "A count {a}");
    }

    proptest! {
        #[test]
        fn prop_amount_within_bounds(u in 0.0f64..1.0, max in 1u64..10_000_000, power in 1i32..6) {
            let amount = skewed_amount(u, max, power);
            prop_assert!(amount >= 1);
            prop_assert!(amount <= max);
        }
    }
}
