//! Pari-mutuel operator liquidity simulator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! runs the baseline Monte Carlo batch and the borrow-limit sweep, then
//! prints and (optionally) saves the report.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use parimutuel_sim::config::{self, AppConfig};
use parimutuel_sim::engine::MatchConfig;
use parimutuel_sim::simulation::{run_sweep, MonteCarlo, SimulationReport, SweepPoint};
use parimutuel_sim::storage;
use parimutuel_sim::types::SimError;

const BANNER: &str = r#"
  ____   _    ____  ___       __  __ _   _ _____ _   _ _____ _
 |  _ \ / \  |  _ \|_ _|     |  \/  | | | |_   _| | | | ____| |
 | |_) / _ \ | |_) || |_____ | |\/| | | | | | | | | | |  _| | |
 |  __/ ___ \|  _ < | |_____|| |  | | |_| | | | | |_| | |___| |___
 |_| /_/   \_\_| \_\___|     |_|  |_|\___/  |_|  \___/|_____|_____|

  Operator liquidity simulator
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;
    cfg.validate()?;

    init_logging(&cfg);

    println!("{BANNER}");
    info!(
        config = %config_path,
        mode = %cfg.simulation.mode,
        runs = cfg.simulation.runs,
        seed = cfg.simulation.seed,
        bettors = cfg.market.num_bettors,
        implied_probability = cfg.market.implied_probability,
        "Simulator starting up"
    );

    let driver = MonteCarlo::new(cfg.simulation.runs, cfg.simulation.seed);

    // -- Baseline and sweep ---------------------------------------------

    let baseline_limit = cfg.market.borrow_limit_percentage;
    let baseline_config = cfg.match_config(baseline_limit)?;

    let points = cfg
        .sweep_plan()
        .limits()
        .into_iter()
        .map(|limit| cfg.match_config(limit).map(|mc| (limit, mc)))
        .collect::<Result<Vec<_>, SimError>>()?;

    let cancel = Arc::new(AtomicBool::new(false));
    let work = async {
        let baseline =
            run_baseline(driver, baseline_limit, baseline_config, Arc::clone(&cancel)).await?;
        let sweep = run_sweep(driver, points, Arc::clone(&cancel)).await?;
        Ok::<_, anyhow::Error>((baseline, sweep))
    };
    tokio::pin!(work);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let finished = tokio::select! {
        result = &mut work => Some(result),
        _ = &mut shutdown => None,
    };
    let (baseline, sweep) = match finished {
        Some(result) => result?,
        None => {
            warn!("Shutdown signal received. Cancelling running batches.");
            cancel.store(true, Ordering::Relaxed);
            // Batches stop before their next run; wait so none outlive main.
            let _ = work.await;
            return Err(SimError::Interrupted("ctrl-c during simulation".into()).into());
        }
    };

    // -- Report ----------------------------------------------------------

    let report = SimulationReport::new(
        cfg.simulation.mode,
        &driver,
        cfg.market.num_bettors,
        cfg.market.implied_probability,
        baseline,
        sweep,
    );

    println!("{}", report.render());

    if let Some(path) = cfg.output.report_path.as_deref() {
        storage::save_report(&report, Some(path))?;
        info!(path, id = %report.id, "Report written");
    }

    info!(sweep_points = report.sweep.len(), "Simulator finished.");
    Ok(())
}

/// Baseline batch at the configured borrow limit, on stream 0.
async fn run_baseline(
    driver: MonteCarlo,
    limit: f64,
    config: MatchConfig,
    cancel: Arc<AtomicBool>,
) -> Result<SweepPoint> {
    let point = tokio::task::spawn_blocking(move || -> Result<SweepPoint, SimError> {
        let summary = driver.run_until(&config, 0, &cancel)?;
        Ok(SweepPoint {
            borrow_limit_percentage: limit,
            max_bet_amount: config.max_bet_amount,
            summary,
        })
    })
    .await??;
    Ok(point)
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parimutuel_sim=info"));

    let json_logging = std::env::var("PARIMUTUEL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    let _ = cfg;
}
