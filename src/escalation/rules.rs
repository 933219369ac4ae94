//! Escalation Policy Tables
//!
//! Level rules are evaluated top-down and the first match wins. The rule
//! sets overlap, so the order of [`LEVEL_RULES`] is part of the policy.
//!
//! | Level    | Base multiplier |
//! |----------|-----------------|
//! | None     | 1.0             |
//! | Low      | 1.2             |
//! | Medium   | 1.5             |
//! | High     | 2.0             |
//! | Critical | 3.0             |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::escalation::factors::EscalationFactors;

/// Upper bound on the punishment multiplier
pub const MAX_PUNISHMENT_MULTIPLIER: f64 = 5.0;

/// Upper bound on the derived duration multiplier
pub const MAX_DURATION_MULTIPLIER: f64 = 10.0;

const DURATION_SCALE: f64 = 1.2;

/// Ordinal risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationLevel {
    pub fn base_multiplier(&self) -> f64 {
        match self {
            EscalationLevel::None => 1.0,
            EscalationLevel::Low => 1.2,
            EscalationLevel::Medium => 1.5,
            EscalationLevel::High => 2.0,
            EscalationLevel::Critical => 3.0,
        }
    }
}

type Predicate = fn(&EscalationFactors) -> bool;

/// Ordered level rules, highest level first
pub const LEVEL_RULES: &[(EscalationLevel, Predicate)] = &[
    (EscalationLevel::Critical, |f| {
        f.ban_evasion_suspected || f.total_bans >= 3
    }),
    (EscalationLevel::High, |f| {
        f.is_repeat_offender
            || f.recent_violations >= 10
            || f.recent_punishments >= 2
            || f.average_punishment_severity >= 0.8
    }),
    (EscalationLevel::Medium, |f| {
        f.recent_violations >= 5
            || f.medium_term_violations >= 15
            || f.violation_trend > 0.5
            || f.average_punishment_severity >= 0.6
    }),
    (EscalationLevel::Low, |f| {
        f.recent_violations >= 2
            || f.long_term_violations >= 10
            || f.average_punishment_severity >= 0.3
    }),
];

/// Aggravating factors applied on top of the level's base multiplier
pub const AGGRAVATING_FACTORS: &[(f64, Predicate)] = &[
    (1.3, |f| f.is_repeat_offender),
    (2.0, |f| f.ban_evasion_suspected),
    (1.2, |f| f.violation_trend > 0.7),
    (1.3, |f| f.severity_trend > 0.7),
];

/// Conditions that demand immediate action regardless of level
const URGENCY_RULES: &[Predicate] = &[
    |f| f.ban_evasion_suspected,
    |f| f.recent_violations >= 15,
    |f| f.is_repeat_offender && f.recent_violations >= 5,
    |f| f.average_punishment_severity >= 0.9,
];

pub fn determine_level(factors: &EscalationFactors) -> EscalationLevel {
    LEVEL_RULES
        .iter()
        .find(|(_, matches)| matches(factors))
        .map(|(level, _)| *level)
        .unwrap_or(EscalationLevel::None)
}

pub fn punishment_multiplier(level: EscalationLevel, factors: &EscalationFactors) -> f64 {
    let multiplier = AGGRAVATING_FACTORS
        .iter()
        .filter(|(_, applies)| applies(factors))
        .fold(level.base_multiplier(), |acc, (factor, _)| acc * factor);

    multiplier.min(MAX_PUNISHMENT_MULTIPLIER)
}

/// Output of an escalation evaluation, built in one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub level: EscalationLevel,
    pub punishment_multiplier: f64,
    pub factors: EscalationFactors,
    pub timestamp: DateTime<Utc>,
}

impl EscalationDecision {
    pub fn from_factors(factors: EscalationFactors, timestamp: DateTime<Utc>) -> Self {
        let level = determine_level(&factors);
        let punishment_multiplier = punishment_multiplier(level, &factors);
        Self {
            level,
            punishment_multiplier,
            factors,
            timestamp,
        }
    }

    /// Harsher scaling for ban durations than for punishment severity
    pub fn duration_multiplier(&self) -> f64 {
        (self.punishment_multiplier * DURATION_SCALE).min(MAX_DURATION_MULTIPLIER)
    }

    pub fn requires_immediate_action(&self) -> bool {
        self.level == EscalationLevel::Critical
            || URGENCY_RULES.iter().any(|rule| rule(&self.factors))
    }
}
