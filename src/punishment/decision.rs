//! Decisions returned to the hosting application

use serde::{Deserialize, Serialize};

use crate::escalation::EscalationDecision;
use crate::punishment::ban::{format_remaining, BanType, PlayerBan};
use crate::punishment::record::PunishmentType;

/// Outcome of processing a violation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionType {
    Warning,
    TemporaryBan,
    PermanentBan,
    HardwareBan,
    AlreadyBanned,
}

impl From<PunishmentType> for DecisionType {
    fn from(punishment: PunishmentType) -> Self {
        match punishment {
            PunishmentType::Warning => DecisionType::Warning,
            PunishmentType::TemporaryBan => DecisionType::TemporaryBan,
            PunishmentType::PermanentBan => DecisionType::PermanentBan,
            PunishmentType::HardwareBan => DecisionType::HardwareBan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunishmentDecision {
    pub decision_type: DecisionType,
    /// The ban issued by this decision, or the existing one for `AlreadyBanned`
    pub ban: Option<PlayerBan>,
    pub reason: String,
    /// Escalation evaluated for this batch; absent when evaluation was skipped
    pub escalation: Option<EscalationDecision>,
}

impl PunishmentDecision {
    pub fn already_banned(ban: PlayerBan) -> Self {
        Self {
            decision_type: DecisionType::AlreadyBanned,
            reason: ban.reason.clone(),
            ban: Some(ban),
            escalation: None,
        }
    }

    /// True for every ban outcome, including `AlreadyBanned`
    pub fn requires_disconnection(&self) -> bool {
        !matches!(self.decision_type, DecisionType::Warning)
    }
}

/// Answer for the login / connect path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCheckResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub active_ban: Option<PlayerBan>,
}

impl ConnectionCheckResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            active_ban: None,
        }
    }

    /// Denied, with a message templated on the ban type
    pub fn denied(ban: PlayerBan, remaining_ms: i64) -> Self {
        let message = match ban.ban_type {
            BanType::Temporary => format!(
                "You are temporarily banned: {}. Time remaining: {}",
                ban.reason,
                format_remaining(remaining_ms)
            ),
            BanType::Permanent => format!(
                "You are permanently banned: {}. Contact support if you believe this is a mistake.",
                ban.reason
            ),
            BanType::Hardware => format!(
                "Your hardware is banned: {}. This ban cannot be appealed.",
                ban.reason
            ),
        };

        Self {
            allowed: false,
            reason: Some(message),
            active_ban: Some(ban),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_disconnection_required_for_bans_only() {
        let ban = PlayerBan::permanent("p".to_string(), "aimbot".to_string(), Utc::now());
        assert!(PunishmentDecision::already_banned(ban).requires_disconnection());

        let warning = PunishmentDecision {
            decision_type: DecisionType::Warning,
            ban: None,
            reason: "r".to_string(),
            escalation: None,
        };
        assert!(!warning.requires_disconnection());
    }

    #[test]
    fn test_denied_messages_per_ban_type() {
        let now = Utc::now();
        let temp = PlayerBan::temporary(
            "p".to_string(),
            "fly".to_string(),
            Duration::hours(1),
            now,
        );
        let result = ConnectionCheckResult::denied(temp, 45 * 60_000);
        assert!(!result.allowed);
        assert_eq!(
            result.reason.as_deref(),
            Some("You are temporarily banned: fly. Time remaining: 45m")
        );

        let perm = PlayerBan::permanent("p".to_string(), "aimbot".to_string(), now);
        let result = ConnectionCheckResult::denied(perm, -1);
        assert!(result.reason.unwrap().contains("Contact support"));

        let hw = PlayerBan::hardware("p".to_string(), "evasion".to_string(), None, now);
        let result = ConnectionCheckResult::denied(hw, -1);
        assert!(result.reason.unwrap().contains("cannot be appealed"));
    }
}
