use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::audit::{AuditSeverity, DEFAULT_MAX_ENTRIES};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Runtime configuration for the enforcement engine host.
///
/// Enforcement policy (thresholds, ban durations, multipliers) is fixed in
/// code and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcerConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Background maintenance configuration
    pub maintenance: MaintenanceConfig,
    /// Audit trail configuration
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Emit span open/close events
    pub log_spans: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Run the periodic cleanup task
    pub enabled: bool,
    /// Seconds between cleanup runs
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Entries retained before the oldest are evicted
    pub max_entries: usize,
    /// Entries below this severity are dropped
    pub min_severity: String,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                log_spans: false,
            },
            maintenance: MaintenanceConfig {
                enabled: true,
                cleanup_interval_secs: 300,
            },
            audit: AuditConfig {
                max_entries: DEFAULT_MAX_ENTRIES,
                min_severity: "info".to_string(),
            },
        }
    }
}

impl MaintenanceConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl AuditConfig {
    pub fn min_severity(&self) -> Result<AuditSeverity> {
        self.min_severity
            .parse::<AuditSeverity>()
            .map_err(|e| anyhow::anyhow!(e))
    }
}

impl EnforcerConfig {
    /// Load configuration from `FAIRPLAY_*` environment variables and validate
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Logging configuration
        if let Some(level) = lookup("FAIRPLAY_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Some(spans) = lookup("FAIRPLAY_LOG_SPANS") {
            config.logging.log_spans = spans
                .parse()
                .context("Invalid FAIRPLAY_LOG_SPANS value")?;
        }

        // Maintenance configuration
        if let Some(interval) = lookup("FAIRPLAY_CLEANUP_INTERVAL_SECS") {
            config.maintenance.cleanup_interval_secs = interval
                .parse()
                .context("Invalid FAIRPLAY_CLEANUP_INTERVAL_SECS value")?;
        }

        if let Some(enabled) = lookup("FAIRPLAY_MAINTENANCE_ENABLED") {
            config.maintenance.enabled = enabled
                .parse()
                .context("Invalid FAIRPLAY_MAINTENANCE_ENABLED value")?;
        }

        // Audit configuration
        if let Some(max_entries) = lookup("FAIRPLAY_AUDIT_MAX_ENTRIES") {
            config.audit.max_entries = max_entries
                .parse()
                .context("Invalid FAIRPLAY_AUDIT_MAX_ENTRIES value")?;
        }

        if let Some(severity) = lookup("FAIRPLAY_AUDIT_MIN_SEVERITY") {
            config.audit.min_severity = severity;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log level: {} (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.maintenance.cleanup_interval_secs == 0 {
            return Err(anyhow::anyhow!("Cleanup interval must be non-zero"));
        }

        if self.audit.max_entries == 0 {
            return Err(anyhow::anyhow!("Audit log capacity must be non-zero"));
        }

        self.audit
            .min_severity()
            .context("Invalid audit minimum severity")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<EnforcerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnforcerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.log_spans);
        assert!(config.maintenance.enabled);
        assert_eq!(config.maintenance.cleanup_interval(), Duration::from_secs(300));
        assert_eq!(config.audit.max_entries, 10_000);
        assert_eq!(config.audit.min_severity().unwrap(), AuditSeverity::Info);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FAIRPLAY_LOG_LEVEL", "DEBUG"),
            ("FAIRPLAY_LOG_SPANS", "true"),
            ("FAIRPLAY_CLEANUP_INTERVAL_SECS", "30"),
            ("FAIRPLAY_MAINTENANCE_ENABLED", "false"),
            ("FAIRPLAY_AUDIT_MAX_ENTRIES", "50"),
            ("FAIRPLAY_AUDIT_MIN_SEVERITY", "warning"),
        ])
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.log_spans);
        assert_eq!(config.maintenance.cleanup_interval_secs, 30);
        assert!(!config.maintenance.enabled);
        assert_eq!(config.audit.max_entries, 50);
        assert_eq!(config.audit.min_severity().unwrap(), AuditSeverity::Warning);
    }

    #[test]
    fn test_config_validation() {
        assert!(load(&[("FAIRPLAY_CLEANUP_INTERVAL_SECS", "0")]).is_err());
        assert!(load(&[("FAIRPLAY_CLEANUP_INTERVAL_SECS", "soon")]).is_err());
        assert!(load(&[("FAIRPLAY_AUDIT_MAX_ENTRIES", "0")]).is_err());
        assert!(load(&[("FAIRPLAY_AUDIT_MIN_SEVERITY", "loud")]).is_err());
        assert!(load(&[("FAIRPLAY_LOG_LEVEL", "verbose")]).is_err());
    }
}
