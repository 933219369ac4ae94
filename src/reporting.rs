//! Enforcement Reporting
//!
//! Read-only aggregation over escalation profiles, bans and appeals:
//! per-player risk classification and a system health score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::escalation::{EscalationManager, PlayerEscalationProfile};
use crate::punishment::{BanManager, BanType};
use crate::violation::ViolationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
    /// No escalation profile for the player
    Unknown,
}

/// Inputs to the risk score for one player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub total_violations: u64,
    pub total_bans: usize,
    pub suspicious: bool,
    pub violation_trend: f64,
    pub currently_banned: bool,
}

impl RiskInputs {
    pub fn from_profile(
        profile: &PlayerEscalationProfile,
        total_bans: usize,
        currently_banned: bool,
    ) -> Self {
        Self {
            total_violations: profile.total_violations(),
            total_bans,
            suspicious: profile.has_suspicious_patterns(),
            violation_trend: profile.violation_trend(),
            currently_banned,
        }
    }
}

/// Weighted score in `[0, 1]`
pub fn risk_score(inputs: &RiskInputs) -> f64 {
    let flag = |set: bool| if set { 1.0 } else { 0.0 };

    0.3 * (inputs.total_violations as f64 / 50.0).min(1.0)
        + 0.3 * (inputs.total_bans as f64 / 3.0).min(1.0)
        + 0.2 * flag(inputs.suspicious)
        + 0.1 * (inputs.violation_trend / 2.0).min(1.0)
        + 0.1 * flag(inputs.currently_banned)
}

pub fn classify_risk(score: f64) -> RiskLevel {
    match score {
        s if s >= 0.8 => RiskLevel::Critical,
        s if s >= 0.6 => RiskLevel::High,
        s if s >= 0.4 => RiskLevel::Medium,
        s if s >= 0.2 => RiskLevel::Low,
        _ => RiskLevel::Minimal,
    }
}

/// 100 minus penalties for ban, critical-profile and appeal rates,
/// clamped to `[0, 100]`
pub fn health_score(
    active_bans: usize,
    tracked_players: usize,
    critical_profiles: usize,
    profiles: usize,
    pending_appeals: usize,
) -> f64 {
    let rate = |part: usize, whole: usize| {
        if whole == 0 {
            0.0
        } else {
            part as f64 / whole as f64
        }
    };

    let score = 100.0
        - 40.0 * rate(active_bans, tracked_players)
        - 40.0 * rate(critical_profiles, profiles)
        - 20.0 * rate(pending_appeals, active_bans);

    score.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationStatistics {
    pub tracked_profiles: usize,
    pub total_violations: u64,
    pub suspicious_profiles: usize,
    pub most_common_violation: Option<ViolationKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanStatistics {
    pub active_bans: usize,
    pub temporary_bans: usize,
    pub permanent_bans: usize,
    pub hardware_bans: usize,
    pub pending_appeals: usize,
    pub registered_fingerprints: usize,
    pub punishments_issued: u64,
    pub evasions_detected: u64,
    pub appeals_submitted: u64,
    pub appeals_approved: u64,
    pub appeals_denied: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunishmentSystemStatistics {
    pub escalation: EscalationStatistics,
    pub bans: BanStatistics,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub health_score: f64,
    pub generated_at: DateTime<Utc>,
}

impl EscalationManager {
    pub fn statistics(&self) -> EscalationStatistics {
        let profiles = self.profiles_snapshot();

        let mut kind_totals: BTreeMap<ViolationKind, u64> = BTreeMap::new();
        for profile in &profiles {
            for (kind, count) in profile.violation_type_counts() {
                *kind_totals.entry(*kind).or_insert(0) += count;
            }
        }

        // ties go to the earlier kind
        let most_common_violation = kind_totals
            .iter()
            .fold(None, |best: Option<(ViolationKind, u64)>, (kind, count)| match best {
                Some((_, top)) if top >= *count => best,
                _ => Some((*kind, *count)),
            })
            .map(|(kind, _)| kind);

        EscalationStatistics {
            tracked_profiles: profiles.len(),
            total_violations: profiles.iter().map(|p| p.total_violations()).sum(),
            suspicious_profiles: profiles.iter().filter(|p| p.has_suspicious_patterns()).count(),
            most_common_violation,
        }
    }
}

impl BanManager {
    pub fn ban_statistics(&self) -> BanStatistics {
        let active = self.active_bans();
        let count_of = |ban_type: BanType| active.iter().filter(|b| b.ban_type == ban_type).count();
        let counters = self.counters();

        BanStatistics {
            active_bans: active.len(),
            temporary_bans: count_of(BanType::Temporary),
            permanent_bans: count_of(BanType::Permanent),
            hardware_bans: count_of(BanType::Hardware),
            pending_appeals: self.pending_appeals().len(),
            registered_fingerprints: self.hardware_registry().fingerprint_count(),
            punishments_issued: counters.punishments_issued(),
            evasions_detected: counters.evasions_detected(),
            appeals_submitted: counters.appeals_submitted(),
            appeals_approved: counters.appeals_approved(),
            appeals_denied: counters.appeals_denied(),
        }
    }

    fn risk_for_profile(&self, profile: &PlayerEscalationProfile) -> RiskLevel {
        let total_bans = self
            .punishment_history(&profile.player_id)
            .iter()
            .filter(|record| record.punishment_type.is_ban())
            .count();
        let banned = self.is_currently_banned(&profile.player_id);

        classify_risk(risk_score(&RiskInputs::from_profile(profile, total_bans, banned)))
    }

    /// `Unknown` when the player has no escalation profile
    pub fn player_risk(&self, player_id: &str) -> RiskLevel {
        match self.escalation_manager().profile_snapshot(player_id) {
            Some(profile) => self.risk_for_profile(&profile),
            None => RiskLevel::Unknown,
        }
    }

    pub fn statistics(&self) -> PunishmentSystemStatistics {
        let escalation = self.escalation_manager().statistics();
        let bans = self.ban_statistics();

        let mut risk_distribution = BTreeMap::new();
        for profile in self.escalation_manager().profiles_snapshot() {
            *risk_distribution
                .entry(self.risk_for_profile(&profile))
                .or_insert(0) += 1;
        }

        let critical = risk_distribution
            .get(&RiskLevel::Critical)
            .copied()
            .unwrap_or(0);
        let health_score = health_score(
            bans.active_bans,
            escalation.tracked_profiles,
            critical,
            escalation.tracked_profiles,
            bans.pending_appeals,
        );

        PunishmentSystemStatistics {
            escalation,
            bans,
            risk_distribution,
            health_score,
            generated_at: self.clock.now(),
        }
    }
}
