//! Borrow-limit sweeps.
//!
//! Each limit is an independent Monte Carlo batch. Batches run on tokio's
//! blocking pool and are collected in input order; sweep point `i` uses
//! random stream `i + 1` (stream 0 is the baseline). Setting the cancel
//! flag stops every batch before its next run.

use futures::future::join_all;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::driver::MonteCarlo;
use super::stats::SimulationSummary;
use crate::engine::MatchConfig;
use crate::types::{Amount, SimError};

/// Which borrow limits to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepPlan {
    /// Explicit list of percentages.
    Limits(Vec<f64>),
    /// `steps` evenly spaced percentages from `start` to `end` inclusive.
    Linspace { start: f64, end: f64, steps: usize },
}

impl SweepPlan {
    pub fn limits(&self) -> Vec<f64> {
        match self {
            SweepPlan::Limits(limits) => limits.clone(),
            SweepPlan::Linspace { start, end, steps } => linspace(*start, *end, *steps),
        }
    }
}

/// Evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Outcome of one borrow limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub borrow_limit_percentage: f64,
    pub max_bet_amount: Amount,
    pub summary: SimulationSummary,
}

/// Evaluate every `(limit, config)` pair. Results keep the input order.
pub async fn run_sweep(
    driver: MonteCarlo,
    points: Vec<(f64, MatchConfig)>,
    cancel: Arc<AtomicBool>,
) -> Result<Vec<SweepPoint>, SimError> {
    info!(points = points.len(), runs = driver.runs(), "Starting borrow-limit sweep");

    let handles = points.into_iter().enumerate().map(|(i, (limit, config))| {
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || -> Result<SweepPoint, SimError> {
            let summary = driver.run_until(&config, i as u64 + 1, &cancel)?;
            Ok(SweepPoint {
                borrow_limit_percentage: limit,
                max_bet_amount: config.max_bet_amount,
                summary,
            })
        })
    });

    // Join everything before reporting so no batch outlives the call.
    let mut results = Vec::new();
    for joined in join_all(handles).await {
        let point = joined.map_err(|e| SimError::Interrupted(format!("sweep task failed: {e}")))??;
        results.push(point);
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
