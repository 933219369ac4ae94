//! Punishment history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::violation::Violation;

/// Kind of punishment issued to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PunishmentType {
    Warning,
    TemporaryBan,
    PermanentBan,
    HardwareBan,
}

impl PunishmentType {
    /// Severity score used when averaging a player's history
    pub fn severity_score(&self) -> f64 {
        match self {
            PunishmentType::Warning => 0.2,
            PunishmentType::TemporaryBan => 0.5,
            PunishmentType::PermanentBan => 0.8,
            PunishmentType::HardwareBan => 1.0,
        }
    }

    pub fn is_ban(&self) -> bool {
        !matches!(self, PunishmentType::Warning)
    }
}

/// Immutable entry in a player's punishment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunishmentRecord {
    pub id: Uuid,
    pub player_id: String,
    pub punishment_type: PunishmentType,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
    /// Ban length in milliseconds; -1 for non-expiring, 0 for warnings
    pub duration_ms: i64,
    pub violations: Vec<Violation>,
}

impl PunishmentRecord {
    pub fn new(
        player_id: String,
        punishment_type: PunishmentType,
        reason: String,
        issued_at: DateTime<Utc>,
        duration_ms: i64,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            punishment_type,
            reason,
            issued_at,
            duration_ms,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_scores() {
        assert_eq!(PunishmentType::Warning.severity_score(), 0.2);
        assert_eq!(PunishmentType::TemporaryBan.severity_score(), 0.5);
        assert_eq!(PunishmentType::PermanentBan.severity_score(), 0.8);
        assert_eq!(PunishmentType::HardwareBan.severity_score(), 1.0);
    }

    #[test]
    fn test_warning_is_not_a_ban() {
        assert!(!PunishmentType::Warning.is_ban());
        assert!(PunishmentType::TemporaryBan.is_ban());
        assert!(PunishmentType::HardwareBan.is_ban());
    }
}
