//! Per-Player Violation Ledger
//!
//! Rolling record of a player's violations plus the statistics the
//! escalation rules read: windowed counts, rate and severity trends, and
//! suspicious-pattern flags.
//!
//! All bounded queues evict oldest-first, and entries older than
//! [`HISTORY_RETENTION_DAYS`] are purged on every mutation. Aggregate
//! counters (`total_violations`, per-kind counts) are lifetime values and
//! are never purged.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::violation::{Violation, ViolationEntry, ViolationKind};

/// Maximum violation entries kept per player
pub const MAX_VIOLATION_HISTORY: usize = 1000;

/// Sample size feeding the trend estimators and pattern detector
pub const PATTERN_SAMPLE_SIZE: usize = 50;

/// Trends report 0 below this many samples
pub const MIN_TREND_SAMPLES: usize = 10;

/// Entries older than this are purged on every mutation
pub const HISTORY_RETENTION_DAYS: i64 = 7;

const BURST_LENGTH: usize = 5;
const BURST_MAX_SPAN_SECONDS: i64 = 60;

const SATURATION_SEVERITY: f64 = 0.8;
const SATURATION_RATIO: f64 = 0.7;

const DOMINANCE_RATIO: f64 = 0.9;
const DOMINANCE_MIN_TOTAL: u64 = 10;

/// Escalation profile for one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEscalationProfile {
    pub player_id: String,

    violation_history: VecDeque<ViolationEntry>,
    violation_type_counts: BTreeMap<ViolationKind, u64>,

    /// Last-N samples feeding the trend estimators (kept pairwise in sync)
    violation_timestamps: VecDeque<DateTime<Utc>>,
    severity_history: VecDeque<f64>,

    total_violations: u64,
    total_severity: f64,

    pub last_activity: DateTime<Utc>,
    pub creation_time: DateTime<Utc>,
}

impl PlayerEscalationProfile {
    pub fn new(player_id: String, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            violation_history: VecDeque::new(),
            violation_type_counts: BTreeMap::new(),
            violation_timestamps: VecDeque::new(),
            severity_history: VecDeque::new(),
            total_violations: 0,
            total_severity: 0.0,
            last_activity: now,
            creation_time: now,
        }
    }

    /// Absorb a batch of violations, all stamped with `now`
    pub fn add_violations(&mut self, violations: &[Violation], now: DateTime<Utc>) {
        for violation in violations {
            self.violation_history.push_back(ViolationEntry {
                violation: *violation,
                timestamp: now,
            });
            self.violation_timestamps.push_back(now);
            self.severity_history.push_back(violation.severity);

            *self.violation_type_counts.entry(violation.kind).or_insert(0) += 1;
            self.total_violations += 1;
            self.total_severity += violation.severity;
        }

        while self.violation_history.len() > MAX_VIOLATION_HISTORY {
            self.violation_history.pop_front();
        }
        while self.violation_timestamps.len() > PATTERN_SAMPLE_SIZE {
            self.violation_timestamps.pop_front();
            self.severity_history.pop_front();
        }

        self.purge_expired(now);
        self.last_activity = now;
    }

    /// Drop entries older than the retention window
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(HISTORY_RETENTION_DAYS);

        while self
            .violation_history
            .front()
            .is_some_and(|e| e.timestamp < cutoff)
        {
            self.violation_history.pop_front();
        }

        while self.violation_timestamps.front().is_some_and(|t| *t < cutoff) {
            self.violation_timestamps.pop_front();
            self.severity_history.pop_front();
        }
    }

    /// Entries with timestamp >= `since`
    pub fn violation_count(&self, since: DateTime<Utc>) -> usize {
        // history is time-ordered, so scan from the newest end
        self.violation_history
            .iter()
            .rev()
            .take_while(|e| e.timestamp >= since)
            .count()
    }

    /// Ratio of second-half to first-half violation rate over the sample.
    ///
    /// Values above 1 mean violations are accelerating. Returns 0 with
    /// fewer than [`MIN_TREND_SAMPLES`] samples or when either half spans
    /// no time.
    pub fn violation_trend(&self) -> f64 {
        let samples: Vec<DateTime<Utc>> = self.violation_timestamps.iter().copied().collect();
        if samples.len() < MIN_TREND_SAMPLES {
            return 0.0;
        }

        let (first, second) = samples.split_at(samples.len() / 2);
        match (rate_per_hour(first), rate_per_hour(second)) {
            (Some(first_rate), Some(second_rate)) => second_rate / first_rate,
            _ => 0.0,
        }
    }

    /// Ratio of second-half to first-half mean severity over the sample
    pub fn severity_trend(&self) -> f64 {
        let samples: Vec<f64> = self.severity_history.iter().copied().collect();
        if samples.len() < MIN_TREND_SAMPLES {
            return 0.0;
        }

        let (first, second) = samples.split_at(samples.len() / 2);
        let first_mean = mean(first);
        if first_mean <= 0.0 {
            return 0.0;
        }
        mean(second) / first_mean
    }

    /// Burst, severity saturation, or single-kind dominance
    pub fn has_suspicious_patterns(&self) -> bool {
        self.has_burst() || self.has_severity_saturation() || self.has_type_dominance()
    }

    fn has_burst(&self) -> bool {
        let samples: Vec<DateTime<Utc>> = self.violation_timestamps.iter().copied().collect();
        samples.windows(BURST_LENGTH).any(|window| {
            let span = window[BURST_LENGTH - 1] - window[0];
            span <= Duration::seconds(BURST_MAX_SPAN_SECONDS)
        })
    }

    fn has_severity_saturation(&self) -> bool {
        if self.severity_history.is_empty() {
            return false;
        }
        let severe = self
            .severity_history
            .iter()
            .filter(|s| **s >= SATURATION_SEVERITY)
            .count();
        severe as f64 / self.severity_history.len() as f64 > SATURATION_RATIO
    }

    fn has_type_dominance(&self) -> bool {
        if self.total_violations < DOMINANCE_MIN_TOTAL {
            return false;
        }
        let top = self.violation_type_counts.values().copied().max().unwrap_or(0);
        top as f64 / self.total_violations as f64 > DOMINANCE_RATIO
    }

    /// Kind with the highest lifetime count; ties go to the earlier kind
    /// in declaration order.
    pub fn most_common_violation_type(&self) -> Option<ViolationKind> {
        let mut best: Option<(ViolationKind, u64)> = None;
        for (kind, count) in &self.violation_type_counts {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((*kind, *count));
            }
        }
        best.map(|(kind, _)| kind)
    }

    pub fn violation_history(&self) -> &VecDeque<ViolationEntry> {
        &self.violation_history
    }

    pub fn violation_type_counts(&self) -> &BTreeMap<ViolationKind, u64> {
        &self.violation_type_counts
    }

    pub fn total_violations(&self) -> u64 {
        self.total_violations
    }

    pub fn total_severity(&self) -> f64 {
        self.total_severity
    }

    pub fn average_severity(&self) -> f64 {
        if self.total_violations == 0 {
            return 0.0;
        }
        self.total_severity / self.total_violations as f64
    }

    /// Eligible for garbage collection: idle for `max_idle` and holding
    /// no retained violations.
    pub fn is_stale(&self, now: DateTime<Utc>, max_idle: Duration) -> bool {
        now - self.last_activity >= max_idle && self.violation_history.is_empty()
    }
}

/// Count / elapsed hours across a time-ordered half; None if it spans no time
fn rate_per_hour(half: &[DateTime<Utc>]) -> Option<f64> {
    let (first, last) = (half.first()?, half.last()?);
    let elapsed_hours = (*last - *first).num_milliseconds() as f64 / 3_600_000.0;
    if elapsed_hours <= 0.0 {
        return None;
    }
    Some(half.len() as f64 / elapsed_hours)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
