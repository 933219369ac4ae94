//! Punishment Policy Tables
//!
//! Severity aggregation, the ordered punishment rules and the temporary
//! ban ladder. Everything here is pure so the policy can be checked
//! without a live [`BanManager`](crate::punishment::BanManager).
//!
//! | Rule (first match wins)                          | Outcome        |
//! |--------------------------------------------------|----------------|
//! | severity >= 0.9 or >= 5 violations in the batch  | Permanent ban  |
//! | any prior permanent or hardware ban              | Hardware ban   |
//! | >= 3 prior temporary bans                        | Permanent ban  |
//! | >= 3 prior warnings or any prior temporary ban   | Temporary ban  |
//! | severity >= 0.6                                  | Temporary ban  |
//! | otherwise                                        | Warning        |

use chrono::Duration;

use crate::punishment::record::{PunishmentRecord, PunishmentType};
use crate::violation::{Violation, ViolationKind};

const WORST_WEIGHT: f64 = 0.7;
const MEAN_WEIGHT: f64 = 0.3;

/// Everything the punishment rules consider for one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffenseContext {
    pub total_severity: f64,
    pub violation_count: usize,
    pub prior_permanent_or_hardware_bans: usize,
    pub prior_temporary_bans: usize,
    pub prior_warnings: usize,
}

impl OffenseContext {
    /// None for an empty batch
    pub fn new(violations: &[Violation], history: &[PunishmentRecord]) -> Option<Self> {
        let total_severity = total_severity(violations)?;
        let count_of = |wanted: &[PunishmentType]| {
            history
                .iter()
                .filter(|r| wanted.contains(&r.punishment_type))
                .count()
        };

        Some(Self {
            total_severity,
            violation_count: violations.len(),
            prior_permanent_or_hardware_bans: count_of(&[
                PunishmentType::PermanentBan,
                PunishmentType::HardwareBan,
            ]),
            prior_temporary_bans: count_of(&[PunishmentType::TemporaryBan]),
            prior_warnings: count_of(&[PunishmentType::Warning]),
        })
    }
}

type Rule = fn(&OffenseContext) -> bool;

pub const PUNISHMENT_RULES: &[(PunishmentType, Rule)] = &[
    (PunishmentType::PermanentBan, |c| {
        c.total_severity >= 0.9 || c.violation_count >= 5
    }),
    (PunishmentType::HardwareBan, |c| {
        c.prior_permanent_or_hardware_bans >= 1
    }),
    (PunishmentType::PermanentBan, |c| c.prior_temporary_bans >= 3),
    (PunishmentType::TemporaryBan, |c| {
        c.prior_warnings >= 3 || c.prior_temporary_bans >= 1
    }),
    (PunishmentType::TemporaryBan, |c| c.total_severity >= 0.6),
];

pub fn determine_punishment(context: &OffenseContext) -> PunishmentType {
    PUNISHMENT_RULES
        .iter()
        .find(|(_, matches)| matches(context))
        .map(|(punishment, _)| *punishment)
        .unwrap_or(PunishmentType::Warning)
}

/// Temporary ban length by number of earlier temporary bans
const TEMPORARY_BAN_LADDER_HOURS: [i64; 3] = [1, 24, 7 * 24];

pub fn temporary_ban_duration(prior_temporary_bans: usize) -> Duration {
    let step = prior_temporary_bans.min(TEMPORARY_BAN_LADDER_HOURS.len() - 1);
    Duration::hours(TEMPORARY_BAN_LADDER_HOURS[step])
}

/// Worst severity weighted 0.7, mean weighted 0.3; None when empty
pub fn total_severity(violations: &[Violation]) -> Option<f64> {
    if violations.is_empty() {
        return None;
    }

    let max = violations
        .iter()
        .map(|v| v.severity)
        .fold(f64::MIN, f64::max);
    let mean = violations.iter().map(|v| v.severity).sum::<f64>() / violations.len() as f64;

    Some(max * WORST_WEIGHT + mean * MEAN_WEIGHT)
}

/// "Detected violations: aimbot (3), fly (1)", most frequent first
pub fn synthesize_reason(violations: &[Violation]) -> String {
    let mut counts: Vec<(ViolationKind, usize)> = Vec::new();
    for violation in violations {
        match counts.iter_mut().find(|(kind, _)| *kind == violation.kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((violation.kind, 1)),
        }
    }
    // stable: ties keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let parts: Vec<String> = counts
        .iter()
        .map(|(kind, count)| format!("{} ({})", kind, count))
        .collect();

    format!("Detected violations: {}", parts.join(", "))
}

pub fn evasion_reason(banned_player: &str) -> String {
    format!(
        "Ban evasion detected: hardware shared with banned player {}",
        banned_player
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn v(kind: ViolationKind, severity: f64) -> Violation {
        Violation::new(kind, severity)
    }

    fn history(types: &[PunishmentType]) -> Vec<PunishmentRecord> {
        types
            .iter()
            .map(|t| {
                PunishmentRecord::new("p".to_string(), *t, "r".to_string(), Utc::now(), 0, vec![])
            })
            .collect()
    }

    fn decide(violations: &[Violation], prior: &[PunishmentType]) -> PunishmentType {
        let context = OffenseContext::new(violations, &history(prior)).unwrap();
        determine_punishment(&context)
    }

    #[test]
    fn test_total_severity_weights_worst() {
        let batch = [
            v(ViolationKind::Aimbot, 1.0),
            v(ViolationKind::Fly, 0.0),
            v(ViolationKind::Fly, 0.0),
            v(ViolationKind::Fly, 0.0),
        ];
        // 1.0 * 0.7 + 0.25 * 0.3
        assert!((total_severity(&batch).unwrap() - 0.775).abs() < 1e-9);
        assert_eq!(total_severity(&[]), None);
    }

    #[test]
    fn test_empty_batch_has_no_context() {
        assert!(OffenseContext::new(&[], &[]).is_none());
    }

    #[test]
    fn test_clean_player_low_severity_warned() {
        assert_eq!(decide(&[v(ViolationKind::Reach, 0.3)], &[]), PunishmentType::Warning);
    }

    #[test]
    fn test_high_severity_temporary_ban() {
        assert_eq!(decide(&[v(ViolationKind::Reach, 0.7)], &[]), PunishmentType::TemporaryBan);
    }

    #[test]
    fn test_extreme_severity_permanent() {
        assert_eq!(decide(&[v(ViolationKind::Aimbot, 0.95)], &[]), PunishmentType::PermanentBan);
    }

    #[test]
    fn test_five_violations_permanent() {
        let batch = vec![v(ViolationKind::Fly, 0.1); 5];
        assert_eq!(decide(&batch, &[]), PunishmentType::PermanentBan);
    }

    #[test]
    fn test_history_driven_outcomes() {
        let mild = [v(ViolationKind::Reach, 0.2)];
        use PunishmentType::*;

        assert_eq!(decide(&mild, &[PermanentBan]), HardwareBan);
        assert_eq!(decide(&mild, &[TemporaryBan, TemporaryBan, TemporaryBan]), PermanentBan);
        assert_eq!(decide(&mild, &[TemporaryBan]), TemporaryBan);
        assert_eq!(decide(&mild, &[Warning, Warning, Warning]), TemporaryBan);
        assert_eq!(decide(&mild, &[Warning, Warning]), Warning);
    }

    #[test]
    fn test_temporary_ban_ladder() {
        assert_eq!(temporary_ban_duration(0), Duration::hours(1));
        assert_eq!(temporary_ban_duration(1), Duration::hours(24));
        assert_eq!(temporary_ban_duration(2), Duration::days(7));
        assert_eq!(temporary_ban_duration(9), Duration::days(7));
    }

    #[test]
    fn test_reason_sorted_by_frequency() {
        let batch = [
            v(ViolationKind::Fly, 0.2),
            v(ViolationKind::Aimbot, 0.2),
            v(ViolationKind::Aimbot, 0.2),
            v(ViolationKind::Reach, 0.2),
        ];
        assert_eq!(
            synthesize_reason(&batch),
            "Detected violations: aimbot (2), fly (1), reach (1)"
        );
    }
}
