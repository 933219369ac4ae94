use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use fairplay_enforcer::{spawn_maintenance, AuditLog, BanManager, EnforcerConfig, Violation};

/// One line of input from the detector
#[derive(Debug, Deserialize)]
struct ViolationReport {
    player_id: String,
    violations: Vec<Violation>,
    #[serde(default)]
    hardware_fingerprint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EnforcerConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check FAIRPLAY_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting fairplay enforcer");

    let audit = Arc::new(
        AuditLog::with_capacity(config.audit.max_entries)
            .with_min_severity(config.audit.min_severity()?),
    );
    let manager = Arc::new(BanManager::new().with_audit_log(audit));

    let maintenance = if config.maintenance.enabled {
        info!(
            "Background maintenance every {}s",
            config.maintenance.cleanup_interval_secs
        );
        Some(spawn_maintenance(
            manager.clone(),
            config.maintenance.cleanup_interval(),
        ))
    } else {
        warn!("Background maintenance disabled");
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let report: ViolationReport = match serde_json::from_str(&line) {
            Ok(report) => report,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed report");
                continue;
            }
        };

        // re-clamp severities that arrived over the wire
        let violations: Vec<Violation> = report
            .violations
            .iter()
            .map(|v| Violation::new(v.kind, v.severity))
            .collect();

        let decision = match manager.process_violations(
            &report.player_id,
            &violations,
            report.hardware_fingerprint.as_deref(),
        ) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(line = line_number, error = %e, "Rejected report");
                continue;
            }
        };

        let mut output = serde_json::to_string(&decision).context("Failed to encode decision")?;
        output.push('\n');
        stdout
            .write_all(output.as_bytes())
            .await
            .context("Failed to write decision")?;
    }

    if let Some(handle) = maintenance {
        handle.abort();
    }

    let stats = manager.statistics();
    let mut output =
        serde_json::to_string_pretty(&stats).context("Failed to encode statistics")?;
    output.push('\n');
    stdout
        .write_all(output.as_bytes())
        .await
        .context("Failed to write statistics")?;
    stdout.flush().await.context("Failed to flush stdout")?;

    info!(
        processed = line_number,
        health_score = stats.health_score,
        "Input exhausted, shutting down"
    );

    Ok(())
}

/// Logs go to stderr so stdout carries only decisions
fn init_logging(config: &EnforcerConfig) -> Result<()> {
    let log_level = match config.logging.level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_span_events(if config.logging.log_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
