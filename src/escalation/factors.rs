//! Escalation Factors
//!
//! Immutable snapshot of everything the escalation rules look at, derived
//! from a player's ledger and punishment history at one instant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::escalation::profile::PlayerEscalationProfile;
use crate::punishment::PunishmentRecord;

const RECENT_WINDOW_HOURS: i64 = 1;
const MEDIUM_WINDOW_HOURS: i64 = 24;
const LONG_WINDOW_DAYS: i64 = 7;
const RECENT_PUNISHMENT_HOURS: i64 = 24;

const REPEAT_OFFENDER_BANS: usize = 2;
const REPEAT_OFFENDER_RECENT_PUNISHMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationFactors {
    /// Violations in the last hour
    pub recent_violations: usize,
    /// Violations in the last 24 hours
    pub medium_term_violations: usize,
    /// Violations in the last 7 days
    pub long_term_violations: usize,
    /// Punishments issued in the last 24 hours
    pub recent_punishments: usize,
    /// Bans of any kind across all history
    pub total_bans: usize,
    /// Mean punishment severity score across all history
    pub average_punishment_severity: f64,
    pub violation_trend: f64,
    pub severity_trend: f64,
    pub is_repeat_offender: bool,
    pub ban_evasion_suspected: bool,
}

impl EscalationFactors {
    pub fn compute(
        profile: &PlayerEscalationProfile,
        history: &[PunishmentRecord],
        now: DateTime<Utc>,
    ) -> Self {
        let recent_cutoff = now - Duration::hours(RECENT_PUNISHMENT_HOURS);
        let recent_punishments = history.iter().filter(|r| r.issued_at >= recent_cutoff).count();
        let total_bans = history.iter().filter(|r| r.punishment_type.is_ban()).count();

        let average_punishment_severity = if history.is_empty() {
            0.0
        } else {
            history
                .iter()
                .map(|r| r.punishment_type.severity_score())
                .sum::<f64>()
                / history.len() as f64
        };

        Self {
            recent_violations: profile.violation_count(now - Duration::hours(RECENT_WINDOW_HOURS)),
            medium_term_violations: profile
                .violation_count(now - Duration::hours(MEDIUM_WINDOW_HOURS)),
            long_term_violations: profile.violation_count(now - Duration::days(LONG_WINDOW_DAYS)),
            recent_punishments,
            total_bans,
            average_punishment_severity,
            violation_trend: profile.violation_trend(),
            severity_trend: profile.severity_trend(),
            is_repeat_offender: total_bans >= REPEAT_OFFENDER_BANS
                || recent_punishments >= REPEAT_OFFENDER_RECENT_PUNISHMENTS,
            ban_evasion_suspected: profile.has_suspicious_patterns(),
        }
    }
}
