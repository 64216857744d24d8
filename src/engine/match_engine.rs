//! Single-match simulation.
//!
//! `Created → BetsPlaced → (WithdrawalsApplied) → Resolved → Settled`.
//! Each bet is stamped with the odds of the pool as it stood before the
//! bet joined it. Withdrawals (tracked books only) are all priced against
//! one snapshot taken at the start of the phase. Settlement borrows from
//! the capped facility when the payout exceeds the balance.

use tracing::debug;

use super::book::Book;
use super::state::MatchState;
use super::{MatchConfig, MatchPhase};
use crate::market::bets::coin_flip;
use crate::market::{BetGenerator, OddsEngine, UniformSource, WithdrawalPricer};
use crate::types::{to_signed, Bet, BookMode, MatchReport, Side, SignedAmount, SimError};

/// Owns the book and balance sheet for one run. Single use.
pub struct MatchEngine {
    config: MatchConfig,
    odds: OddsEngine,
    generator: BetGenerator,
    pricer: WithdrawalPricer,
    book: Book,
    state: MatchState,
    phase: MatchPhase,
    bets_placed: usize,
    withdrawals: usize,
    skipped_withdrawals: usize,
    winner: Option<Side>,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        let mut state = MatchState::new(config.initial_balance, config.borrow_limit_percentage);
        let book = match config.mode {
            BookMode::Tracked if config.opening_liquidity > 0 => {
                state.take_opening_loan(2 * u128::from(config.opening_liquidity));
                Book::with_opening_liquidity(config.mode, config.opening_liquidity)
            }
            mode => Book::new(mode),
        };

        Self {
            odds: OddsEngine::new(config.implied_probability),
            generator: BetGenerator::new(config.max_bet_amount, config.skew_power),
            pricer: WithdrawalPricer::new(config.cash_out_cap),
            book,
            state,
            phase: MatchPhase::Created,
            bets_placed: 0,
            withdrawals: 0,
            skipped_withdrawals: 0,
            winner: None,
            config,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Withdrawals that were drawn but could not be priced (zero odds).
    pub fn skipped_withdrawals(&self) -> usize {
        self.skipped_withdrawals
    }

    /// Run every phase in order and report.
    pub fn run<R: UniformSource + ?Sized>(mut self, rng: &mut R) -> Result<MatchReport, SimError> {
        self.place_bets(rng)?;
        self.apply_withdrawals(rng)?;
        self.resolve(rng)?;
        self.settle()
    }

    /// Bet phase: every synthetic bettor draws a stake and a side.
    pub fn place_bets<R: UniformSource + ?Sized>(&mut self, rng: &mut R) -> Result<(), SimError> {
        self.advance(&[MatchPhase::Created], MatchPhase::BetsPlaced)?;

        let tracked = self.book.tracks_bets();
        for _ in 0..self.config.num_bettors {
            let amount = self.generator.next_bet_amount(rng);
            let side = self.generator.next_side(rng);
            // Only a tracked book keeps the placement odds
            let odds = if tracked {
                self.odds.compute(self.book.pool()).for_side(side)
            } else {
                0
            };
            self.book.record(Bet::new(amount, side, odds));
            self.state.receive_stake(amount);
            self.bets_placed += 1;
        }

        debug!(
            bettors = self.bets_placed,
            pool = %self.book.pool(),
            balance = self.state.balance(),
            "Bets placed"
        );
        Ok(())
    }

    /// Withdrawal phase. A no-op for aggregate books.
    ///
    /// Returns the total cash-out value paid.
    pub fn apply_withdrawals<R: UniformSource + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<u128, SimError> {
        if !self.book.tracks_bets() {
            self.require(&[MatchPhase::BetsPlaced], MatchPhase::WithdrawalsApplied)?;
            return Ok(0);
        }
        self.advance(&[MatchPhase::BetsPlaced], MatchPhase::WithdrawalsApplied)?;

        let snapshot = self.odds.compute(self.book.pool());
        let probability = self.config.withdrawal_probability;
        let pricer = &self.pricer;
        let mut skipped = 0usize;
        let mut count = 0usize;
        let mut outflow = 0u128;

        for side in Side::ALL {
            let current = snapshot.for_side(side);
            let (withdrawn, value) = self.book.withdraw_where(side, |bet| {
                if rng.next_unit() >= probability {
                    return None;
                }
                let quote = pricer.price(bet.amount, bet.odds, current);
                if quote.is_none() {
                    skipped += 1;
                }
                quote.map(|q| q.value)
            });
            count += withdrawn;
            outflow += value;
        }

        self.state.pay_withdrawals(outflow);
        self.withdrawals = count;
        self.skipped_withdrawals = skipped;

        debug!(
            withdrawals = count,
            skipped,
            outflow,
            odds = %snapshot,
            pool = %self.book.pool(),
            "Withdrawals applied"
        );
        Ok(outflow)
    }

    /// Draw the winner uniformly.
    pub fn resolve<R: UniformSource + ?Sized>(&mut self, rng: &mut R) -> Result<Side, SimError> {
        self.require(
            &[MatchPhase::BetsPlaced, MatchPhase::WithdrawalsApplied],
            MatchPhase::Resolved,
        )?;
        let winner = coin_flip(rng);
        self.resolve_with(winner)
    }

    /// Fix the winner without drawing.
    pub fn resolve_with(&mut self, winner: Side) -> Result<Side, SimError> {
        self.advance(
            &[MatchPhase::BetsPlaced, MatchPhase::WithdrawalsApplied],
            MatchPhase::Resolved,
        )?;
        self.winner = Some(winner);
        Ok(winner)
    }

    /// Pay the winners, borrowing to cover a shortfall, and report.
    pub fn settle(&mut self) -> Result<MatchReport, SimError> {
        self.advance(&[MatchPhase::Resolved], MatchPhase::Settled)?;
        let winner = self.winner.ok_or_else(|| SimError::InvalidTransition {
            from: MatchPhase::Resolved.to_string(),
            to: MatchPhase::Settled.to_string(),
        })?;

        let mode = self.config.mode;
        let payout = self
            .book
            .payout_for(winner, &self.odds, self.config.payout_percentage);
        let facility_borrowed = self.state.settle_payout(payout);
        let closing_balance = self.state.balance();
        let initial = SignedAmount::from(self.state.initial_balance());
        let debt = to_signed(self.state.borrowed_amount());

        let profit = match mode {
            BookMode::Aggregate => closing_balance - debt,
            BookMode::Tracked => closing_balance - debt - initial,
        };
        if mode == BookMode::Tracked && profit > 0 {
            self.state.repay_all();
        }

        let pool_volume = self.book.pool().volume();
        let base = match mode {
            BookMode::Aggregate => pool_volume as f64,
            BookMode::Tracked => initial as f64,
        };
        let profit_percentage = if pool_volume > 0 && base > 0.0 {
            profit as f64 * 100.0 / base
        } else {
            0.0
        };

        let report = MatchReport {
            mode,
            winner,
            bets_placed: self.bets_placed,
            withdrawals: self.withdrawals,
            stake_inflow: self.state.stake_inflow(),
            withdrawal_outflow: self.state.withdrawal_outflow(),
            payout,
            facility_borrowed,
            closing_balance,
            pool_volume,
            profit,
            profit_percentage,
            borrowed_amount: self.state.borrowed_amount(),
        };

        debug!(
            %winner,
            payout,
            facility_borrowed,
            profit,
            profit_pct = format!("{:.2}%", profit_percentage),
            borrowed = report.borrowed_amount,
            "Match settled"
        );
        Ok(report)
    }

    fn require(&self, from: &[MatchPhase], to: MatchPhase) -> Result<(), SimError> {
        if from.contains(&self.phase) {
            Ok(())
        } else {
            Err(SimError::InvalidTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn advance(&mut self, from: &[MatchPhase], to: MatchPhase) -> Result<(), SimError> {
        self.require(from, to)?;
        self.phase = to;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
