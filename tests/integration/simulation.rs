//! Match and simulation harness.
//!
//! Drives whole matches through the public API, both from scripted draws
//! with hand-checked outcomes and from seeded sources where only the
//! ledger invariants are asserted.

use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parimutuel_sim::config::AppConfig;
use parimutuel_sim::engine::{MatchConfig, MatchEngine};
use parimutuel_sim::market::{compute_odds, OddsMove, SeededSource, WithdrawalPricer};
use parimutuel_sim::simulation::{run_sweep, MonteCarlo, SimulationReport, SweepPoint};
use parimutuel_sim::storage;
use parimutuel_sim::types::*;

use crate::scripted_source::ScriptedSource;

fn temp_path() -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("parimutuel_it_report_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

// ---------------------------------------------------------------------------
// Pricing primitives
// ---------------------------------------------------------------------------

#[test]
fn test_empty_pool_has_no_odds() {
    assert_eq!(compute_odds(&Pool::new(0, 0), 1_025), Odds::UNDEFINED);
}

#[test]
fn test_one_sided_pool() {
    assert_eq!(compute_odds(&Pool::new(100, 0), 1_000), Odds::new(ODDS_SCALE, 0));
}

#[test]
fn test_even_bet_pays_double() {
    assert_eq!(Bet::new(100, Side::A, 2 * ODDS_SCALE).payout(), 200);
}

#[test]
fn test_shortened_odds_cash_out() {
    let quote = WithdrawalPricer::default()
        .price(100, 2 * ODDS_SCALE, ODDS_SCALE)
        .unwrap();
    assert_eq!(quote.direction, OddsMove::Shortened);
    assert_eq!(quote.original_payout, 200);
    assert_eq!(quote.value, 80);
}

// ---------------------------------------------------------------------------
// Scripted matches
// ---------------------------------------------------------------------------

#[test]
fn test_no_bettors() {
    let config = MatchConfig {
        num_bettors: 0,
        ..MatchConfig::default()
    };
    let report = MatchEngine::new(config).run(&mut SeededSource::new(3)).unwrap();
    assert_eq!(report.payout, 0);
    assert_eq!(report.profit_percentage, 0.0);
    assert_eq!(report.borrowed_amount, 0);
}

#[test]
fn test_scripted_tracked_match() {
    let config = MatchConfig {
        mode: BookMode::Tracked,
        initial_balance: 1_000,
        num_bettors: 1,
        max_bet_amount: 100,
        implied_probability: 1_000,
        borrow_limit_percentage: dec!(10),
        withdrawal_probability: 0.0,
        opening_liquidity: 100,
        ..MatchConfig::default()
    };
    // stake 100 on A, no cash-out, A wins
    let mut rng = ScriptedSource::new(vec![0.0, 0.1, 0.5, 0.1]);
    let report = MatchEngine::new(config).run(&mut rng).unwrap();

    assert_eq!(rng.remaining(), 0);
    assert_eq!(report.winner, Side::A);
    assert_eq!(report.bets_placed, 1);
    assert_eq!(report.withdrawals, 0);
    assert_eq!(report.payout, 200);
    assert_eq!(report.closing_balance, 900);
    assert_eq!(report.profit, -300);
    assert_eq!(report.profit_percentage, -30.0);
    assert_eq!(report.borrowed_amount, 200);
    assert_eq!(report.pool_volume, 300);
}

#[test]
fn test_scripted_aggregate_shortfall() {
    let config = MatchConfig {
        initial_balance: 10,
        num_bettors: 2,
        max_bet_amount: 100,
        implied_probability: 500,
        payout_percentage: 100,
        borrow_limit_percentage: dec!(50),
        ..MatchConfig::default()
    };
    // 100 on A, 100 on B, B wins; the aggregate book draws nothing for withdrawals
    let mut rng = ScriptedSource::new(vec![0.0, 0.1, 0.0, 0.9, 0.9]);
    let report = MatchEngine::new(config).run(&mut rng).unwrap();

    assert_eq!(rng.remaining(), 0);
    assert_eq!(report.winner, Side::B);
    assert_eq!(report.payout, 400);
    assert_eq!(report.facility_borrowed, 5);
    assert_eq!(report.closing_balance, -185);
    assert_eq!(report.borrowed_amount, 5);
    assert_eq!(report.profit, -190);
    assert_eq!(report.profit_percentage, -95.0);
}

#[test]
fn test_settle_before_resolve_rejected() {
    let mut engine = MatchEngine::new(MatchConfig::default());
    assert!(matches!(
        engine.settle(),
        Err(SimError::InvalidTransition { .. })
    ));
}

// ---------------------------------------------------------------------------
// Ledger invariants over seeded runs
// ---------------------------------------------------------------------------

fn stressed(mode: BookMode) -> MatchConfig {
    MatchConfig {
        mode,
        initial_balance: 10_000,
        num_bettors: 100,
        max_bet_amount: 100,
        implied_probability: 1_100,
        borrow_limit_percentage: dec!(5),
        opening_liquidity: if mode == BookMode::Tracked { 400 } else { 0 },
        ..MatchConfig::default()
    }
}

#[test]
fn test_conservation_and_cap_over_seeds() {
    for mode in [BookMode::Aggregate, BookMode::Tracked] {
        let config = stressed(mode);
        let cap = 500u128;
        for seed in 0..200u64 {
            let report = MatchEngine::new(config.clone())
                .run(&mut SeededSource::new(seed))
                .unwrap();

            let expected = SignedAmount::from(config.initial_balance)
                + to_signed(report.stake_inflow)
                - to_signed(report.withdrawal_outflow)
                - to_signed(report.payout)
                + to_signed(report.facility_borrowed);
            assert_eq!(report.closing_balance, expected, "mode {mode} seed {seed}");
            assert!(report.facility_borrowed <= cap, "mode {mode} seed {seed}");

            match mode {
                BookMode::Aggregate => {
                    assert_eq!(report.borrowed_amount, report.facility_borrowed);
                    assert_eq!(report.withdrawals, 0);
                }
                BookMode::Tracked => {
                    if report.profit > 0 {
                        assert_eq!(report.borrowed_amount, 0);
                    } else {
                        assert_eq!(report.borrowed_amount, 800 + report.facility_borrowed);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config → sweep → report pipeline
// ---------------------------------------------------------------------------

const PIPELINE_CONFIG: &str = r#"
    [simulation]
    runs = 8
    seed = 11
    mode = "tracked"

    [market]
    initial_balance = 100000
    num_bettors = 60
    implied_probability = 1035
    borrow_limit_percentage = 1.0
    opening_liquidity = 200

    [sweep]
    borrow_limits = [0.5, 2.0]
"#;

#[tokio::test]
async fn test_config_to_saved_report() {
    let cfg = AppConfig::from_toml_str(PIPELINE_CONFIG).unwrap();
    cfg.validate().unwrap();

    let driver = MonteCarlo::new(cfg.simulation.runs, cfg.simulation.seed);
    let baseline_config = cfg.match_config(1.0).unwrap();
    let baseline = SweepPoint {
        borrow_limit_percentage: 1.0,
        max_bet_amount: baseline_config.max_bet_amount,
        summary: driver.run(&baseline_config, 0).unwrap(),
    };

    let points: Vec<(f64, MatchConfig)> = cfg
        .sweep_plan()
        .limits()
        .into_iter()
        .map(|limit| (limit, cfg.match_config(limit).unwrap()))
        .collect();
    let sweep = run_sweep(driver, points, Arc::new(AtomicBool::new(false)))
        .await
        .unwrap();

    // max bet derived per point: floor(100000 × limit / 100)
    assert_eq!(baseline.max_bet_amount, 1_000);
    assert_eq!(sweep[0].max_bet_amount, 500);
    assert_eq!(sweep[1].max_bet_amount, 2_000);
    assert!(sweep.iter().all(|p| p.summary.runs == 8));

    let report = SimulationReport::new(
        cfg.simulation.mode,
        &driver,
        cfg.market.num_bettors,
        cfg.market.implied_probability,
        baseline,
        sweep,
    );
    assert!(report.render().contains("Profit by borrow limit"));

    let path = temp_path();
    storage::save_report(&report, Some(&path)).unwrap();
    let loaded = storage::load_report(Some(&path)).unwrap().unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.mode, BookMode::Tracked);
    assert_eq!(loaded.sweep.len(), 2);
    assert_eq!(loaded.sweep[1].borrow_limit_percentage, 2.0);
    storage::delete_report(Some(&path)).unwrap();
}

#[test]
fn test_batches_reproducible() {
    let cfg = AppConfig::from_toml_str(PIPELINE_CONFIG).unwrap();
    let config = cfg.match_config(0.5).unwrap();
    let driver = MonteCarlo::new(5, 99);
    assert_eq!(driver.run(&config, 3).unwrap(), driver.run(&config, 3).unwrap());
}
