//! Simulation driver: Monte Carlo batches, borrow-limit sweeps, and the
//! report they produce.

pub mod driver;
pub mod stats;
pub mod sweep;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

use crate::types::BookMode;
pub use driver::MonteCarlo;
pub use stats::SimulationSummary;
pub use sweep::{run_sweep, SweepPlan, SweepPoint};

/// Everything one invocation of the simulator produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub mode: BookMode,
    pub runs: usize,
    pub seed: u64,
    pub num_bettors: usize,
    pub implied_probability: u32,
    /// The configured borrow limit.
    pub baseline: SweepPoint,
    pub sweep: Vec<SweepPoint>,
}

impl SimulationReport {
    pub fn new(
        mode: BookMode,
        driver: &MonteCarlo,
        num_bettors: usize,
        implied_probability: u32,
        baseline: SweepPoint,
        sweep: Vec<SweepPoint>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode,
            runs: driver.runs(),
            seed: driver.seed(),
            num_bettors,
            implied_probability,
            baseline,
            sweep,
        }
    }

    /// Plain-text summary for the terminal.
    pub fn render(&self) -> String {
        let b = &self.baseline.summary;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Mode: {} | runs: {} | bettors: {} | implied probability: {:.1}%",
            self.mode,
            self.runs,
            self.num_bettors,
            self.implied_probability as f64 / 10.0,
        );
        let _ = writeln!(out, "Borrow limit: {}%", self.baseline.borrow_limit_percentage);
        let _ = writeln!(out, "Average profit percentage: {:.2}%", b.mean_profit_pct);
        let _ = writeln!(out, "Standard deviation of profit percentage: {:.2}%", b.std_profit_pct);
        let _ = writeln!(out, "Average borrowed amount: {:.2}", b.mean_borrowed);
        let _ = writeln!(out, "Maximum borrowed amount: {}", b.max_borrowed);
        let _ = writeln!(out, "Frequency of borrowing: {:.2}%", b.borrow_frequency_pct);

        if !self.sweep.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Profit by borrow limit:");
            for point in &self.sweep {
                let _ = writeln!(
                    out,
                    "Borrow limit: {:.2}%, Average profit: {:.2}%, Std Dev: {:.2}%, Borrow freq: {:.2}%",
                    point.borrow_limit_percentage,
                    point.summary.mean_profit_pct,
                    point.summary.std_profit_pct,
                    point.summary.borrow_frequency_pct,
                );
            }
        }
        out
    }
}
