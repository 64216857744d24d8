//! Operator balance sheet for one match, including the capped
//! borrow-to-cover facility.
//!
//! The ledger records every flow so a settled state can be reconciled:
//! `balance == initial + stakes - withdrawals - payout + facility draws`.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::types::{to_signed, Amount, SignedAmount};

/// Balance, debt, and flow ledger for a single run.
#[derive(Debug, Clone)]
pub struct MatchState {
    initial_balance: Amount,
    balance: SignedAmount,
    borrowed_amount: u128,
    borrow_limit_percentage: Decimal,
    facility_borrowed: u128,
    facility_used: bool,
    stake_inflow: u128,
    withdrawal_outflow: u128,
    payout: u128,
}

impl MatchState {
    pub fn new(initial_balance: Amount, borrow_limit_percentage: Decimal) -> Self {
        Self {
            initial_balance,
            balance: SignedAmount::from(initial_balance),
            borrowed_amount: 0,
            borrow_limit_percentage: borrow_limit_percentage.max(Decimal::ZERO),
            facility_borrowed: 0,
            facility_used: false,
            stake_inflow: 0,
            withdrawal_outflow: 0,
            payout: 0,
        }
    }

    pub fn initial_balance(&self) -> Amount {
        self.initial_balance
    }

    pub fn balance(&self) -> SignedAmount {
        self.balance
    }

    /// Outstanding debt: opening loan plus facility draws, until repaid.
    pub fn borrowed_amount(&self) -> u128 {
        self.borrowed_amount
    }

    pub fn borrow_limit_percentage(&self) -> Decimal {
        self.borrow_limit_percentage
    }

    pub fn facility_borrowed(&self) -> u128 {
        self.facility_borrowed
    }

    pub fn stake_inflow(&self) -> u128 {
        self.stake_inflow
    }

    pub fn withdrawal_outflow(&self) -> u128 {
        self.withdrawal_outflow
    }

    pub fn payout(&self) -> u128 {
        self.payout
    }

    /// A bettor's stake enters the operator's float.
    pub fn receive_stake(&mut self, amount: Amount) {
        self.stake_inflow += u128::from(amount);
        self.balance += SignedAmount::from(amount);
    }

    /// Pay the accumulated cash-out total for the withdrawal phase.
    pub fn pay_withdrawals(&mut self, total: u128) {
        self.withdrawal_outflow += total;
        self.balance -= to_signed(total);
    }

    /// Record a loan that funds opening pool liquidity. The money goes
    /// straight into the pools, so the balance is unchanged.
    ///
    /// Only the debt moves. Accounting that records the loan and also
    /// deducts the seed stake from the balance counts the liquidity twice
    /// and reports tracked profit `2 × L` lower for the same draws; here
    /// the balance still reconciles against stakes, withdrawals, payout and
    /// facility draws.
    pub fn take_opening_loan(&mut self, amount: u128) {
        self.borrowed_amount += amount;
    }

    /// Most the facility will lend in this run: `floor(initial * pct / 100)`.
    pub fn borrow_cap(&self) -> u128 {
        Decimal::from(self.initial_balance)
            .checked_mul(self.borrow_limit_percentage)
            .and_then(|v| v.checked_div(dec!(100)))
            .and_then(|v| v.floor().to_u128())
            .unwrap_or(0)
    }

    /// Borrow up to the cap to cover `amount_needed`. Never fails; any
    /// uncovered remainder stays as a negative balance after payout.
    ///
    /// The facility is drawn at most once per run. The cap is not tracked
    /// cumulatively, so a second draw would lend the full cap again.
    pub fn borrow(&mut self, amount_needed: u128) -> u128 {
        if self.facility_used {
            warn!(
                previously_borrowed = self.facility_borrowed,
                amount_needed, "Borrowing facility drawn twice in one run"
            );
        }
        self.facility_used = true;

        let cap = self.borrow_cap();
        let borrowed = amount_needed.min(cap);
        self.borrowed_amount += borrowed;
        self.facility_borrowed += borrowed;
        self.balance += to_signed(borrowed);

        debug!(
            amount_needed,
            cap,
            borrowed,
            uncovered = amount_needed - borrowed,
            "Facility draw"
        );
        borrowed
    }

    /// Cover any shortfall with the facility, then pay the winners.
    /// Returns the amount borrowed for this payout.
    pub fn settle_payout(&mut self, payout: u128) -> u128 {
        let payout_signed = to_signed(payout);
        let borrowed = if payout_signed > self.balance {
            let shortfall = u128::try_from(payout_signed - self.balance).unwrap_or(u128::MAX);
            self.borrow(shortfall)
        } else {
            0
        };
        self.payout += payout;
        self.balance -= payout_signed;
        borrowed
    }

    /// Treat outstanding debt as repaid in full: the debt is cleared and
    /// the borrowed amount is credited back to the balance.
    pub fn repay_all(&mut self) {
        self.balance += to_signed(self.borrowed_amount);
        self.borrowed_amount = 0;
    }

    /// The balance implied by the ledger flows (before any repayment).
    pub fn ledger_balance(&self) -> SignedAmount {
        SignedAmount::from(self.initial_balance) + to_signed(self.stake_inflow)
            - to_signed(self.withdrawal_outflow)
            - to_signed(self.payout)
            + to_signed(self.facility_borrowed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_state() {
        let state = MatchState::new(1_000_000, dec!(1));
        assert_eq!(state.balance(), 1_000_000);
        assert_eq!(state.borrowed_amount(), 0);
        assert_eq!(state.borrow_cap(), 10_000);
    }

    #[test]
    fn test_fractional_limit_cap() {
        assert_eq!(MatchState::new(1_000_000, dec!(0.5)).borrow_cap(), 5_000);
        assert_eq!(MatchState::new(1_000_000, dec!(0.29)).borrow_cap(), 2_900);
        assert_eq!(MatchState::new(999, dec!(1)).borrow_cap(), 9);
        assert_eq!(MatchState::new(1_000_000, dec!(0)).borrow_cap(), 0);
    }

    #[test]
    fn test_borrow_within_cap() {
        let mut state = MatchState::new(1_000_000, dec!(1));
        assert_eq!(state.borrow(4_000), 4_000);
        assert_eq!(state.balance(), 1_004_000);
        assert_eq!(state.borrowed_amount(), 4_000);
    }

    #[test]
    fn test_borrow_capped() {
        let mut state = MatchState::new(1_000_000, dec!(1));
        assert_eq!(state.borrow(50_000), 10_000);
        assert_eq!(state.facility_borrowed(), 10_000);
    }

    #[test]
    fn test_settle_without_shortfall() {
        let mut state = MatchState::new(1_000, dec!(1));
        state.receive_stake(500);
        assert_eq!(state.settle_payout(1_200), 0);
        assert_eq!(state.balance(), 300);
        assert_eq!(state.borrowed_amount(), 0);
    }

    #[test]
    fn test_settle_with_partial_cover() {
        let mut state = MatchState::new(1_000, dec!(10));
        // shortfall 500, cap 100
        assert_eq!(state.settle_payout(1_500), 100);
        assert_eq!(state.balance(), -400);
        assert_eq!(state.borrowed_amount(), 100);
        assert_eq!(state.ledger_balance(), state.balance());
    }

    #[test]
    fn test_opening_loan_leaves_balance() {
        let mut state = MatchState::new(1_000, dec!(1));
        state.take_opening_loan(80);
        assert_eq!(state.balance(), 1_000);
        assert_eq!(state.borrowed_amount(), 80);
        assert_eq!(state.facility_borrowed(), 0);
    }

    #[test]
    fn test_repay_all() {
        let mut state = MatchState::new(1_000, dec!(10));
        state.borrow(50);
        state.repay_all();
        assert_eq!(state.borrowed_amount(), 0);
        assert_eq!(state.balance(), 1_100);
    }

    #[test]
    fn test_ledger_tracks_all_flows() {
        let mut state = MatchState::new(10_000, dec!(5));
        state.receive_stake(700);
        state.receive_stake(300);
        state.pay_withdrawals(250);
        state.settle_payout(11_200);
        assert_eq!(state.stake_inflow(), 1_000);
        assert_eq!(state.withdrawal_outflow(), 250);
        assert_eq!(state.payout(), 11_200);
        assert_eq!(state.facility_borrowed(), 450);
        assert_eq!(state.balance(), 0);
        assert_eq!(state.ledger_balance(), state.balance());
    }

    proptest! {
        #[test]
        fn prop_borrow_never_exceeds_cap(
            initial in 1u64..10_000_000_000,
            pct_bp in 0u32..10_000,
            needed in 0u128..1_000_000_000_000,
        ) {
            let pct = Decimal::new(i64::from(pct_bp), 2);
            let mut state = MatchState::new(initial, pct);
            let cap = (Decimal::from(initial) * pct / dec!(100)).floor().to_u128().unwrap();
            let borrowed = state.borrow(needed);
            prop_assert!(borrowed <= cap);
            prop_assert_eq!(borrowed, needed.min(cap));
        }
    }
}
