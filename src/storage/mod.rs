//! Report persistence.
//!
//! Writes the aggregated simulation report to a pretty-printed JSON file
//! and reads it back. Match state itself is never persisted.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::simulation::SimulationReport;

/// Default report file path.
pub const DEFAULT_REPORT_FILE: &str = "simulation_report.json";

/// Save a report to a JSON file.
pub fn save_report(report: &SimulationReport, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialise simulation report")?;

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write report to {path}"))?;

    debug!(path, id = %report.id, points = report.sweep.len(), "Report saved");
    Ok(())
}

/// Load a report from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_report(path: Option<&str>) -> Result<Option<SimulationReport>> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report from {path}"))?;

    let report: SimulationReport = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse report from {path}"))?;

    info!(path, id = %report.id, runs = report.runs, "Report loaded from disk");
    Ok(Some(report))
}

/// Delete the report file (for testing or reset).
pub fn delete_report(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete report file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
