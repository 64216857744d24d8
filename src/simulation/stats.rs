//! Aggregate statistics over many match reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::MatchReport;

/// Summary of a batch of simulated matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub runs: usize,
    pub mean_profit_pct: f64,
    /// Population standard deviation.
    pub std_profit_pct: f64,
    pub min_profit_pct: f64,
    pub max_profit_pct: f64,
    pub mean_borrowed: f64,
    pub max_borrowed: u128,
    /// Percentage of runs that ended with outstanding borrowing.
    pub borrow_frequency_pct: f64,
    pub mean_payout: f64,
    pub mean_withdrawals: f64,
}

impl SimulationSummary {
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        let runs = reports.len();
        let profits: Vec<f64> = reports.iter().map(|r| r.profit_percentage).collect();
        let borrowed: Vec<f64> = reports.iter().map(|r| r.borrowed_amount as f64).collect();
        let payouts: Vec<f64> = reports.iter().map(|r| r.payout as f64).collect();
        let withdrawals: Vec<f64> = reports.iter().map(|r| r.withdrawals as f64).collect();

        let borrow_runs = reports.iter().filter(|r| r.borrowed_amount > 0).count();
        let borrow_frequency_pct = if runs > 0 {
            borrow_runs as f64 / runs as f64 * 100.0
        } else {
            0.0
        };

        Self {
            runs,
            mean_profit_pct: mean(&profits),
            std_profit_pct: std_dev(&profits),
            min_profit_pct: profits.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max_profit_pct: profits.iter().copied().reduce(f64::max).unwrap_or(0.0),
            mean_borrowed: mean(&borrowed),
            max_borrowed: reports.iter().map(|r| r.borrowed_amount).max().unwrap_or(0),
            borrow_frequency_pct,
            mean_payout: mean(&payouts),
            mean_withdrawals: mean(&withdrawals),
        }
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={} profit={:.2}% ±{:.2}% [{:.2}%, {:.2}%] borrowed avg={:.2} max={} freq={:.2}%",
            self.runs,
            self.mean_profit_pct,
            self.std_profit_pct,
            self.min_profit_pct,
            self.max_profit_pct,
            self.mean_borrowed,
            self.max_borrowed,
            self.borrow_frequency_pct,
        )
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`); 0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
