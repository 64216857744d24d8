//! Monte Carlo driver: many independent matches under one configuration.
//!
//! Run `i` of stream `s` is seeded with `derive_seed(seed, s, i)`, so a
//! batch is reproducible and different streams (sweep points) never share
//! random sequences.
//!
//! A batch checks its cancel flag before every run and stops with
//! `SimError::Interrupted` once the flag is set.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::stats::SimulationSummary;
use crate::engine::{MatchConfig, MatchEngine};
use crate::market::{derive_seed, SeededSource};
use crate::types::{MatchReport, SimError};

const MAX_PREALLOCATED_RUNS: usize = 4_096;

/// Repeats a match simulation and aggregates the outcomes.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarlo {
    runs: usize,
    seed: u64,
}

impl MonteCarlo {
    pub fn new(runs: usize, seed: u64) -> Self {
        Self { runs, seed }
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Every per-run report for `config` on random stream `stream`.
    pub fn run_reports(&self, config: &MatchConfig, stream: u64) -> Result<Vec<MatchReport>, SimError> {
        self.run_reports_until(config, stream, &AtomicBool::new(false))
    }

    /// Like [`run_reports`](Self::run_reports), but gives up before the next
    /// run once `cancel` is set.
    pub fn run_reports_until(
        &self,
        config: &MatchConfig,
        stream: u64,
        cancel: &AtomicBool,
    ) -> Result<Vec<MatchReport>, SimError> {
        let mut reports = Vec::with_capacity(self.runs.min(MAX_PREALLOCATED_RUNS));
        for index in 0..self.runs {
            if cancel.load(Ordering::Relaxed) {
                warn!(stream, completed = index, runs = self.runs, "Batch cancelled");
                return Err(SimError::Interrupted(format!(
                    "stream {stream} cancelled after {index} of {} runs",
                    self.runs
                )));
            }
            let mut rng = SeededSource::new(derive_seed(self.seed, stream, index as u64));
            let report = MatchEngine::new(config.clone()).run(&mut rng)?;
            debug!(run = index, stream, %report, "Run complete");
            reports.push(report);
        }
        Ok(reports)
    }

    /// Summary statistics for `config` on random stream `stream`.
    pub fn run(&self, config: &MatchConfig, stream: u64) -> Result<SimulationSummary, SimError> {
        self.run_until(config, stream, &AtomicBool::new(false))
    }

    /// Cancellable [`run`](Self::run).
    pub fn run_until(
        &self,
        config: &MatchConfig,
        stream: u64,
        cancel: &AtomicBool,
    ) -> Result<SimulationSummary, SimError> {
        let reports = self.run_reports_until(config, stream, cancel)?;
        let summary = SimulationSummary::from_reports(&reports);
        info!(
            mode = %config.mode,
            stream,
            runs = summary.runs,
            borrow_limit = %config.borrow_limit_percentage,
            mean_profit = format!("{:.2}%", summary.mean_profit_pct),
            std_profit = format!("{:.2}%", summary.std_profit_pct),
            borrow_freq = format!("{:.2}%", summary.borrow_frequency_pct),
            "Simulation batch complete"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
