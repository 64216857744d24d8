//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! `AppConfig::validate` rejects values the engine cannot run with, and
//! `AppConfig::match_config` builds the per-run `MatchConfig` for one
//! borrow limit.

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::fs;

use crate::engine::MatchConfig;
use crate::market::bets::DEFAULT_SKEW_POWER;
use crate::simulation::SweepPlan;
use crate::types::{Amount, BookMode, SimError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub market: MarketConfig,
    #[serde(default)]
    pub withdrawals: WithdrawalsConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub runs: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_mode")]
    pub mode: BookMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub initial_balance: Amount,
    pub num_bettors: usize,
    /// Omitted → derived from the borrow limit.
    #[serde(default)]
    pub max_bet_amount: Option<Amount>,
    /// 1000 = 100%.
    pub implied_probability: u32,
    /// Percentage of the initial balance.
    pub borrow_limit_percentage: f64,
    #[serde(default = "default_payout_percentage")]
    pub payout_percentage: u32,
    #[serde(default = "default_skew_power")]
    pub skew_power: i32,
    /// Per-side seed stake (tracked mode).
    #[serde(default)]
    pub opening_liquidity: Amount,
    /// Per-side seed stake as a multiple of each point's max bet
    /// (tracked mode). Replaces `opening_liquidity` when set.
    #[serde(default)]
    pub opening_liquidity_multiple: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WithdrawalsConfig {
    #[serde(default = "default_withdrawal_probability")]
    pub probability: f64,
    #[serde(default = "default_cash_out_cap")]
    pub cash_out_cap: f64,
}

impl Default for WithdrawalsConfig {
    fn default() -> Self {
        Self {
            probability: default_withdrawal_probability(),
            cash_out_cap: default_cash_out_cap(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SweepConfig {
    #[serde(default)]
    pub borrow_limits: Option<Vec<f64>>,
    #[serde(default)]
    pub linspace: Option<LinspaceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinspaceConfig {
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Where to write the JSON report. None → not written.
    #[serde(default)]
    pub report_path: Option<String>,
}

fn default_seed() -> u64 {
    42
}

fn default_mode() -> BookMode {
    BookMode::Aggregate
}

fn default_payout_percentage() -> u32 {
    95
}

fn default_skew_power() -> i32 {
    DEFAULT_SKEW_POWER
}

fn default_withdrawal_probability() -> f64 {
    0.4
}

fn default_cash_out_cap() -> f64 {
    0.8
}

const DEFAULT_SWEEP_LIMITS: [f64; 4] = [0.5, 1.0, 2.0, 5.0];

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        let m = &self.market;
        if m.initial_balance == 0 {
            return Err(SimError::Config("market.initial_balance must be positive".into()));
        }
        if m.implied_probability == 0 {
            return Err(SimError::Config("market.implied_probability must be positive".into()));
        }
        if m.max_bet_amount == Some(0) {
            return Err(SimError::Config("market.max_bet_amount must be positive".into()));
        }
        check_percentage("market.borrow_limit_percentage", m.borrow_limit_percentage)?;
        if m.payout_percentage > 100 {
            return Err(SimError::Config(format!(
                "market.payout_percentage must be at most 100, got {}",
                m.payout_percentage
            )));
        }
        if m.skew_power < 1 {
            return Err(SimError::Config("market.skew_power must be at least 1".into()));
        }
        if m.opening_liquidity > 0 && m.opening_liquidity_multiple.is_some() {
            return Err(SimError::Config(
                "market: set either opening_liquidity or opening_liquidity_multiple, not both".into(),
            ));
        }

        let w = &self.withdrawals;
        if !(0.0..=1.0).contains(&w.probability) {
            return Err(SimError::Config(format!(
                "withdrawals.probability must be within [0, 1], got {}",
                w.probability
            )));
        }
        if !w.cash_out_cap.is_finite() || w.cash_out_cap < 0.0 {
            return Err(SimError::Config(format!(
                "withdrawals.cash_out_cap must be non-negative, got {}",
                w.cash_out_cap
            )));
        }

        if self.sweep.borrow_limits.is_some() && self.sweep.linspace.is_some() {
            return Err(SimError::Config(
                "sweep: set either borrow_limits or linspace, not both".into(),
            ));
        }
        if let Some(LinspaceConfig { start, end, steps }) = &self.sweep.linspace {
            if *steps == 0 {
                return Err(SimError::Config("sweep.linspace.steps must be positive".into()));
            }
            check_percentage("sweep.linspace.start", *start)?;
            check_percentage("sweep.linspace.end", *end)?;
        }
        if let Some(limits) = &self.sweep.borrow_limits {
            if limits.is_empty() {
                return Err(SimError::Config("sweep.borrow_limits must not be empty".into()));
            }
            for limit in limits {
                check_percentage("sweep.borrow_limits", *limit)?;
            }
        }
        Ok(())
    }

    /// Limits to evaluate in the sweep.
    pub fn sweep_plan(&self) -> SweepPlan {
        match (&self.sweep.linspace, &self.sweep.borrow_limits) {
            (Some(l), _) => SweepPlan::Linspace { start: l.start, end: l.end, steps: l.steps },
            (None, Some(limits)) => SweepPlan::Limits(limits.clone()),
            (None, None) => SweepPlan::Limits(DEFAULT_SWEEP_LIMITS.to_vec()),
        }
    }

    /// Per-run configuration at the given borrow limit.
    pub fn match_config(&self, borrow_limit_percentage: f64) -> Result<MatchConfig, SimError> {
        check_percentage("borrow_limit_percentage", borrow_limit_percentage)?;
        let limit = decimal_from("borrow_limit_percentage", borrow_limit_percentage)?;
        let cash_out_cap = decimal_from("withdrawals.cash_out_cap", self.withdrawals.cash_out_cap)?;

        let m = &self.market;
        let max_bet_amount = match m.max_bet_amount {
            Some(max) => max,
            None => derived_max_bet(m.initial_balance, limit),
        };
        let opening_liquidity = match m.opening_liquidity_multiple {
            Some(multiple) => multiple.saturating_mul(max_bet_amount),
            None => m.opening_liquidity,
        };

        Ok(MatchConfig {
            mode: self.simulation.mode,
            initial_balance: m.initial_balance,
            num_bettors: m.num_bettors,
            max_bet_amount,
            implied_probability: m.implied_probability,
            borrow_limit_percentage: limit,
            payout_percentage: m.payout_percentage,
            withdrawal_probability: self.withdrawals.probability,
            cash_out_cap,
            opening_liquidity,
            skew_power: m.skew_power,
        })
    }
}

/// `floor(initial * limit / 100)`, at least 1.
pub fn derived_max_bet(initial_balance: Amount, borrow_limit_percentage: Decimal) -> Amount {
    (Decimal::from(initial_balance) * borrow_limit_percentage / Decimal::ONE_HUNDRED)
        .floor()
        .to_u64()
        .unwrap_or(Amount::MAX)
        .max(1)
}

fn check_percentage(name: &str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::Config(format!("{name} must be a non-negative number, got {value}")));
    }
    Ok(())
}

fn decimal_from(name: &str, value: f64) -> Result<Decimal, SimError> {
    Decimal::from_f64(value)
        .ok_or_else(|| SimError::InvalidParameter(format!("{name} out of range: {value}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
