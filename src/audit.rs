//! Enforcement Audit Trail
//!
//! Bounded in-memory log of every enforcement action. Each entry is also
//! mirrored to `tracing` at a level matching its severity, so the trail
//! is visible immediately even when nothing reads the buffer.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use crate::punishment::{AppealStatus, PunishmentType};

/// Default number of retained entries
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditEventType {
    PunishmentIssued {
        player_id: String,
        punishment_type: PunishmentType,
        reason: String,
    },
    BanEvasionDetected {
        player_id: String,
        banned_player_id: String,
        /// Digest only; raw fingerprints are never stored here
        fingerprint_digest: String,
    },
    AppealSubmitted {
        player_id: String,
    },
    AppealResolved {
        player_id: String,
        status: AppealStatus,
    },
    BanLifted {
        player_id: String,
        note: String,
    },
    MaintenanceCompleted {
        expired_bans: usize,
        trimmed_records: usize,
        pruned_fingerprints: usize,
        removed_profiles: usize,
    },
}

impl AuditEventType {
    pub fn player_id(&self) -> Option<&str> {
        match self {
            AuditEventType::PunishmentIssued { player_id, .. }
            | AuditEventType::BanEvasionDetected { player_id, .. }
            | AuditEventType::AppealSubmitted { player_id }
            | AuditEventType::AppealResolved { player_id, .. }
            | AuditEventType::BanLifted { player_id, .. } => Some(player_id.as_str()),
            AuditEventType::MaintenanceCompleted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditSeverity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl std::str::FromStr for AuditSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(AuditSeverity::Debug),
            "info" => Ok(AuditSeverity::Info),
            "warning" | "warn" => Ok(AuditSeverity::Warning),
            "error" => Ok(AuditSeverity::Error),
            "critical" => Ok(AuditSeverity::Critical),
            other => Err(format!("unknown audit severity: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub metadata: HashMap<String, String>,
}

impl AuditEntry {
    pub fn new(
        event_type: AuditEventType,
        severity: AuditSeverity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            event_type,
            severity,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    max_entries: usize,
    min_severity: AuditSeverity,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries,
            min_severity: AuditSeverity::Info,
        }
    }

    pub fn with_min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn record(&self, entry: AuditEntry) {
        if entry.severity < self.min_severity {
            return;
        }

        match entry.severity {
            AuditSeverity::Debug => tracing::debug!(event = ?entry.event_type, "AUDIT"),
            AuditSeverity::Info => tracing::info!(event = ?entry.event_type, "AUDIT"),
            AuditSeverity::Warning => tracing::warn!(event = ?entry.event_type, "AUDIT"),
            AuditSeverity::Error => tracing::error!(event = ?entry.event_type, "AUDIT"),
            AuditSeverity::Critical => {
                tracing::error!(event = ?entry.event_type, "AUDIT CRITICAL")
            }
        }

        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    /// Newest first
    pub fn recent(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        entries.iter().rev().take(count).cloned().collect()
    }

    pub fn by_severity(&self, min_severity: AuditSeverity) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|e| e.severity >= min_severity)
            .cloned()
            .collect()
    }

    pub fn for_player(&self, player_id: &str) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|e| e.event_type.player_id() == Some(player_id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
