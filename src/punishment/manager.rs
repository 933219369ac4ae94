//! Ban Manager - Punishment Authority
//!
//! Owns active bans, punishment history, pending appeals and the hardware
//! ban registry. Decides and issues punishments, detects ban evasion and
//! runs the periodic cleanup sweep.
//!
//! All of a player's disciplinary state lives in one [`PlayerDiscipline`]
//! behind a per-player mutex. Issuance (history append, active-ban write,
//! registry update) happens inside that single critical section.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditEventType, AuditLog, AuditSeverity};
use crate::clock::{system_clock, SharedClock};
use crate::error::{EnforcementError, EnforcementResult};
use crate::escalation::{EscalationDecision, EscalationManager};
use crate::maintenance::MaintenanceReport;
use crate::punishment::appeal::BanAppeal;
use crate::punishment::ban::{BanType, PlayerBan};
use crate::punishment::decision::{ConnectionCheckResult, PunishmentDecision};
use crate::punishment::hardware::{fingerprint_digest, HardwareBanRegistry};
use crate::punishment::policy::{
    determine_punishment, evasion_reason, synthesize_reason, temporary_ban_duration,
    OffenseContext,
};
use crate::punishment::record::{PunishmentRecord, PunishmentType};
use crate::violation::Violation;

/// Punishment records retained per player after cleanup
pub const MAX_PUNISHMENT_HISTORY: usize = 100;

/// Everything the authority knows about one player
#[derive(Debug, Default)]
pub(super) struct PlayerDiscipline {
    pub(super) active_ban: Option<PlayerBan>,
    pub(super) history: Vec<PunishmentRecord>,
    pub(super) appeal: Option<BanAppeal>,
}

impl PlayerDiscipline {
    /// The active ban, unless it has already run out
    pub(super) fn current_ban(&self, now: DateTime<Utc>) -> Option<&PlayerBan> {
        self.active_ban.as_ref().filter(|ban| !ban.is_expired(now))
    }

    /// The pending appeal, if it was filed against the ban still in force
    pub(super) fn live_appeal(&self, now: DateTime<Utc>) -> Option<&BanAppeal> {
        let ban = self.current_ban(now)?;
        self.appeal.as_ref().filter(|appeal| appeal.ban == *ban)
    }

    /// Drop an appeal whose ban expired or was replaced. Returns whether
    /// one was dropped.
    pub(super) fn discard_stale_appeal(&mut self, now: DateTime<Utc>) -> bool {
        if self.appeal.is_some() && self.live_appeal(now).is_none() {
            self.appeal = None;
            return true;
        }
        false
    }

    fn holds_hardware_ban(&self, fingerprint: &str) -> bool {
        self.active_ban.as_ref().is_some_and(|ban| {
            ban.ban_type == BanType::Hardware
                && ban.hardware_fingerprint.as_deref() == Some(fingerprint)
        })
    }
}

pub(super) type SharedDiscipline = Arc<Mutex<PlayerDiscipline>>;

/// Lifetime counters, never reset
#[derive(Debug, Default)]
pub struct EnforcementCounters {
    punishments_issued: AtomicU64,
    evasions_detected: AtomicU64,
    pub(super) appeals_submitted: AtomicU64,
    pub(super) appeals_approved: AtomicU64,
    pub(super) appeals_denied: AtomicU64,
}

impl EnforcementCounters {
    pub fn punishments_issued(&self) -> u64 {
        self.punishments_issued.load(Ordering::Relaxed)
    }

    pub fn evasions_detected(&self) -> u64 {
        self.evasions_detected.load(Ordering::Relaxed)
    }

    pub fn appeals_submitted(&self) -> u64 {
        self.appeals_submitted.load(Ordering::Relaxed)
    }

    pub fn appeals_approved(&self) -> u64 {
        self.appeals_approved.load(Ordering::Relaxed)
    }

    pub fn appeals_denied(&self) -> u64 {
        self.appeals_denied.load(Ordering::Relaxed)
    }
}

pub struct BanManager {
    players: DashMap<String, SharedDiscipline>,
    pub(super) registry: HardwareBanRegistry,
    escalation: EscalationManager,
    pub(super) audit: Arc<AuditLog>,
    pub(crate) clock: SharedClock,
    pub(super) counters: EnforcementCounters,
}

impl Default for BanManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BanManager {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            players: DashMap::new(),
            registry: HardwareBanRegistry::new(),
            escalation: EscalationManager::with_clock(clock.clone()),
            audit: Arc::new(AuditLog::new()),
            clock,
            counters: EnforcementCounters::default(),
        }
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn escalation_manager(&self) -> &EscalationManager {
        &self.escalation
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn hardware_registry(&self) -> &HardwareBanRegistry {
        &self.registry
    }

    pub fn counters(&self) -> &EnforcementCounters {
        &self.counters
    }

    pub(super) fn discipline(&self, player_id: &str) -> SharedDiscipline {
        if let Some(entry) = self.players.get(player_id) {
            return entry.value().clone();
        }
        self.players
            .entry(player_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub(super) fn existing_discipline(&self, player_id: &str) -> Option<SharedDiscipline> {
        self.players.get(player_id).map(|entry| entry.value().clone())
    }

    pub(super) fn discipline_snapshot(&self) -> Vec<SharedDiscipline> {
        self.players.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Decide and issue a punishment for a batch of violations.
    ///
    /// An existing, unexpired ban short-circuits everything. Otherwise a
    /// fingerprint shared with a hardware-banned player wins over any
    /// severity-based outcome.
    pub fn process_violations(
        &self,
        player_id: &str,
        violations: &[Violation],
        hardware_fingerprint: Option<&str>,
    ) -> EnforcementResult<PunishmentDecision> {
        let empty = || EnforcementError::EmptyViolations {
            player_id: player_id.to_string(),
        };
        if violations.is_empty() {
            return Err(empty());
        }

        let handle = self.discipline(player_id);
        let mut state = handle.lock();
        let now = self.clock.now();

        if let Some(ban) = state.current_ban(now) {
            debug!(player_id = %player_id, ban_type = ?ban.ban_type, "Player already banned");
            return Ok(PunishmentDecision::already_banned(ban.clone()));
        }

        let escalation = self
            .escalation
            .evaluate_escalation(player_id, violations, &state.history);

        if let Some(fingerprint) = hardware_fingerprint {
            if let Some(banned_peer) = self.registry.find_banned_peer(fingerprint, player_id) {
                return Ok(self.issue_evasion_ban(
                    &mut state,
                    player_id,
                    fingerprint,
                    &banned_peer,
                    violations,
                    escalation,
                    now,
                ));
            }
        }

        let context = OffenseContext::new(violations, &state.history).ok_or_else(empty)?;
        let punishment_type = determine_punishment(&context);
        let reason = synthesize_reason(violations);

        let ban = match punishment_type {
            PunishmentType::Warning => None,
            PunishmentType::TemporaryBan => Some(PlayerBan::temporary(
                player_id.to_string(),
                reason.clone(),
                temporary_ban_duration(context.prior_temporary_bans),
                now,
            )),
            PunishmentType::PermanentBan => Some(PlayerBan::permanent(
                player_id.to_string(),
                reason.clone(),
                now,
            )),
            PunishmentType::HardwareBan => Some(PlayerBan::hardware(
                player_id.to_string(),
                reason.clone(),
                hardware_fingerprint.map(str::to_string),
                now,
            )),
        };

        debug!(
            player_id = %player_id,
            total_severity = context.total_severity,
            violations = context.violation_count,
            punishment = ?punishment_type,
            "Determined punishment"
        );

        self.issue(
            &mut state,
            player_id,
            punishment_type,
            &reason,
            ban.clone(),
            violations,
            now,
        );

        Ok(PunishmentDecision {
            decision_type: punishment_type.into(),
            ban,
            reason,
            escalation: Some(escalation),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn issue_evasion_ban(
        &self,
        state: &mut PlayerDiscipline,
        player_id: &str,
        fingerprint: &str,
        banned_peer: &str,
        violations: &[Violation],
        escalation: EscalationDecision,
        now: DateTime<Utc>,
    ) -> PunishmentDecision {
        let reason = evasion_reason(banned_peer);
        let digest = fingerprint_digest(fingerprint);

        warn!(
            player_id = %player_id,
            banned_player_id = %banned_peer,
            fingerprint = %digest,
            "Ban evasion detected"
        );

        self.counters.evasions_detected.fetch_add(1, Ordering::Relaxed);
        self.audit.record(AuditEntry::new(
            AuditEventType::BanEvasionDetected {
                player_id: player_id.to_string(),
                banned_player_id: banned_peer.to_string(),
                fingerprint_digest: digest,
            },
            AuditSeverity::Critical,
            now,
        ));

        let ban = PlayerBan::hardware(
            player_id.to_string(),
            reason.clone(),
            Some(fingerprint.to_string()),
            now,
        );
        self.issue(
            state,
            player_id,
            PunishmentType::HardwareBan,
            &reason,
            Some(ban.clone()),
            violations,
            now,
        );

        PunishmentDecision {
            decision_type: PunishmentType::HardwareBan.into(),
            ban: Some(ban),
            reason,
            escalation: Some(escalation),
        }
    }

    /// History append, active-ban write and registry update, all under
    /// the caller's hold of the player's lock
    #[allow(clippy::too_many_arguments)]
    fn issue(
        &self,
        state: &mut PlayerDiscipline,
        player_id: &str,
        punishment_type: PunishmentType,
        reason: &str,
        ban: Option<PlayerBan>,
        violations: &[Violation],
        now: DateTime<Utc>,
    ) {
        let duration_ms = ban.as_ref().map_or(0, |b| b.duration_ms);
        state.history.push(PunishmentRecord::new(
            player_id.to_string(),
            punishment_type,
            reason.to_string(),
            now,
            duration_ms,
            violations.to_vec(),
        ));

        if let Some(ban) = ban {
            if let Some(fingerprint) = ban.hardware_fingerprint.as_deref() {
                self.registry.register(fingerprint, player_id);
            }
            state.active_ban = Some(ban);
        }
        if state.discard_stale_appeal(now) {
            debug!(player_id = %player_id, "Discarded appeal against superseded ban");
        }

        self.counters.punishments_issued.fetch_add(1, Ordering::Relaxed);

        info!(
            player_id = %player_id,
            punishment = ?punishment_type,
            duration_ms = duration_ms,
            reason = %reason,
            "Issued punishment"
        );

        let severity = match punishment_type {
            PunishmentType::Warning => AuditSeverity::Info,
            PunishmentType::TemporaryBan => AuditSeverity::Warning,
            PunishmentType::PermanentBan | PunishmentType::HardwareBan => AuditSeverity::Error,
        };
        self.audit.record(AuditEntry::new(
            AuditEventType::PunishmentIssued {
                player_id: player_id.to_string(),
                punishment_type,
                reason: reason.to_string(),
            },
            severity,
            now,
        ));
    }

    /// Login / connect gate
    pub fn check_connection(&self, player_id: &str) -> ConnectionCheckResult {
        let now = self.clock.now();
        match self.active_ban(player_id) {
            Some(ban) => {
                let remaining = ban.remaining_time_ms(now);
                ConnectionCheckResult::denied(ban, remaining)
            }
            None => ConnectionCheckResult::allowed(),
        }
    }

    /// The player's unexpired ban, if any
    pub fn active_ban(&self, player_id: &str) -> Option<PlayerBan> {
        let handle = self.existing_discipline(player_id)?;
        let state = handle.lock();
        state.current_ban(self.clock.now()).cloned()
    }

    pub fn is_currently_banned(&self, player_id: &str) -> bool {
        self.active_ban(player_id).is_some()
    }

    /// Oldest first
    pub fn punishment_history(&self, player_id: &str) -> Vec<PunishmentRecord> {
        self.existing_discipline(player_id)
            .map(|handle| handle.lock().history.clone())
            .unwrap_or_default()
    }

    /// All unexpired bans
    pub fn active_bans(&self) -> Vec<PlayerBan> {
        let now = self.clock.now();
        self.discipline_snapshot()
            .iter()
            .filter_map(|handle| handle.lock().current_ban(now).cloned())
            .collect()
    }

    /// Admin override: remove the active ban without an appeal. A pending
    /// appeal against it is discarded. Returns the lifted ban.
    pub fn lift_ban(&self, player_id: &str, note: &str) -> Option<PlayerBan> {
        let handle = self.existing_discipline(player_id)?;
        let mut state = handle.lock();
        let ban = state.active_ban.take()?;

        if ban.ban_type == BanType::Hardware {
            self.registry.release(player_id);
        }
        if state.appeal.take().is_some() {
            debug!(player_id = %player_id, "Discarded pending appeal for lifted ban");
        }

        info!(player_id = %player_id, ban_type = ?ban.ban_type, note = %note, "Ban lifted");
        self.audit.record(
            AuditEntry::new(
                AuditEventType::BanLifted {
                    player_id: player_id.to_string(),
                    note: note.to_string(),
                },
                AuditSeverity::Warning,
                self.clock.now(),
            )
            .with_metadata("ban_type", &format!("{:?}", ban.ban_type)),
        );

        Some(ban)
    }

    /// Drop expired bans, trim histories to [`MAX_PUNISHMENT_HISTORY`] and
    /// prune registry entries whose members no longer hold a hardware ban.
    /// Returns `(expired_bans, trimmed_records, pruned_fingerprints)`.
    pub fn cleanup(&self) -> (usize, usize, usize) {
        let now = self.clock.now();
        let mut expired_bans = 0;
        let mut trimmed_records = 0;

        for handle in self.discipline_snapshot() {
            let mut state = handle.lock();

            if state.discard_stale_appeal(now) {
                debug!("Discarded appeal against expired ban");
            }

            if state.active_ban.as_ref().is_some_and(|ban| ban.is_expired(now)) {
                state.active_ban = None;
                expired_bans += 1;
            }

            if state.history.len() > MAX_PUNISHMENT_HISTORY {
                state.history.sort_by_key(|record| record.issued_at);
                let excess = state.history.len() - MAX_PUNISHMENT_HISTORY;
                state.history.drain(..excess);
                trimmed_records += excess;
            }
        }

        for (fingerprint, player_id) in self.registry.memberships() {
            // the player's lock is held across the check and the unregister;
            // a player with no state holds no ban
            let dropped = match self.existing_discipline(&player_id) {
                Some(handle) => {
                    let state = handle.lock();
                    !state.holds_hardware_ban(&fingerprint)
                        && self.registry.unregister(&fingerprint, &player_id)
                }
                None => self.registry.unregister(&fingerprint, &player_id),
            };
            if dropped {
                debug!(player_id = %player_id, "Dropped stale hardware registration");
            }
        }
        let pruned_fingerprints = self.registry.drop_empty();

        debug!(
            expired_bans = expired_bans,
            trimmed_records = trimmed_records,
            pruned_fingerprints = pruned_fingerprints,
            "Ban cleanup finished"
        );

        (expired_bans, trimmed_records, pruned_fingerprints)
    }

    /// Profile cleanup plus ban cleanup, audited as one run
    pub fn run_maintenance(&self) -> MaintenanceReport {
        let removed_profiles = self.escalation.cleanup();
        let (expired_bans, trimmed_records, pruned_fingerprints) = self.cleanup();

        let report = MaintenanceReport {
            expired_bans,
            trimmed_records,
            pruned_fingerprints,
            removed_profiles,
        };

        if report.is_empty() {
            debug!("Maintenance found nothing to do");
        } else {
            info!(
                expired_bans = report.expired_bans,
                trimmed_records = report.trimmed_records,
                pruned_fingerprints = report.pruned_fingerprints,
                removed_profiles = report.removed_profiles,
                "Maintenance completed"
            );
        }

        self.audit.record(AuditEntry::new(
            AuditEventType::MaintenanceCompleted {
                expired_bans: report.expired_bans,
                trimmed_records: report.trimmed_records,
                pruned_fingerprints: report.pruned_fingerprints,
                removed_profiles: report.removed_profiles,
            },
            AuditSeverity::Debug,
            self.clock.now(),
        ));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::punishment::DecisionType;
    use crate::violation::ViolationKind;
    use chrono::Duration;

    fn manager() -> (BanManager, ManualClock) {
        let clock = ManualClock::starting_now();
        (BanManager::with_clock(Arc::new(clock.clone())), clock)
    }

    fn mild() -> Vec<Violation> {
        vec![Violation::new(ViolationKind::Reach, 0.2)]
    }

    #[test]
    fn test_empty_batch_rejected_without_state() {
        let (manager, _) = manager();
        let err = manager.process_violations("p1", &[], None).unwrap_err();

        assert_eq!(
            err,
            EnforcementError::EmptyViolations {
                player_id: "p1".to_string()
            }
        );
        assert!(manager.punishment_history("p1").is_empty());
        assert!(manager.escalation_manager().profile_snapshot("p1").is_none());
    }

    #[test]
    fn test_warning_recorded_without_ban() {
        let (manager, _) = manager();
        let decision = manager.process_violations("p1", &mild(), None).unwrap();

        assert_eq!(decision.decision_type, DecisionType::Warning);
        assert!(decision.ban.is_none());
        assert!(decision.escalation.is_some());
        assert_eq!(decision.reason, "Detected violations: reach (1)");
        assert!(!manager.is_currently_banned("p1"));
        assert_eq!(manager.punishment_history("p1").len(), 1);
        assert_eq!(manager.counters().punishments_issued(), 1);
    }

    #[test]
    fn test_hardware_ban_from_history_registers_fingerprint() {
        let (manager, _) = manager();
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Aimbot, 0.95)], None)
            .unwrap();
        manager.lift_ban("p1", "false positive");

        let decision = manager.process_violations("p1", &mild(), Some("fp-1")).unwrap();
        assert_eq!(decision.decision_type, DecisionType::HardwareBan);
        assert!(manager.hardware_registry().is_registered("fp-1", "p1"));
    }

    #[test]
    fn test_lift_ban_releases_registry_and_audits() {
        let (manager, _) = manager();
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Aimbot, 0.95)], None)
            .unwrap();
        manager.lift_ban("p1", "first");
        manager.process_violations("p1", &mild(), Some("fp-1")).unwrap();

        let lifted = manager.lift_ban("p1", "appeal by email").unwrap();
        assert_eq!(lifted.ban_type, BanType::Hardware);
        assert_eq!(manager.hardware_registry().fingerprint_count(), 0);
        assert!(manager.lift_ban("p1", "again").is_none());
        assert!(manager.lift_ban("nobody", "n/a").is_none());

        let lifted_entries = manager
            .audit_log()
            .for_player("p1")
            .into_iter()
            .filter(|e| matches!(e.event_type, AuditEventType::BanLifted { .. }))
            .count();
        assert_eq!(lifted_entries, 2);
    }

    #[test]
    fn test_cleanup_drops_expired_and_trims_history() {
        let (manager, clock) = manager();
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Fly, 0.7)], None)
            .unwrap();
        clock.advance(Duration::hours(2));

        {
            let handle = manager.discipline("p2");
            let mut state = handle.lock();
            for i in 0..(MAX_PUNISHMENT_HISTORY + 20) {
                state.history.push(PunishmentRecord::new(
                    "p2".to_string(),
                    PunishmentType::Warning,
                    format!("r{}", i),
                    clock.now() + Duration::seconds(i as i64),
                    0,
                    vec![],
                ));
            }
        }

        let (expired, trimmed, pruned) = manager.cleanup();
        assert_eq!(expired, 1);
        assert_eq!(trimmed, 20);
        assert_eq!(pruned, 0);

        let history = manager.punishment_history("p2");
        assert_eq!(history.len(), MAX_PUNISHMENT_HISTORY);
        assert_eq!(history[0].reason, "r20");
    }

    #[test]
    fn test_cleanup_prunes_orphaned_registration() {
        let (manager, _) = manager();
        manager.hardware_registry().register("fp-9", "ghost");

        let (_, _, pruned) = manager.cleanup();
        assert_eq!(pruned, 1);
        assert_eq!(manager.hardware_registry().fingerprint_count(), 0);
        assert!(manager.existing_discipline("ghost").is_none());
        assert!(manager.discipline_snapshot().is_empty());
    }

    #[test]
    fn test_cleanup_discards_appeal_against_expired_ban() {
        let (manager, clock) = manager();
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Fly, 0.7)], None)
            .unwrap();
        manager.submit_appeal("p1", "lag", "p1@example.com").unwrap();
        assert_eq!(manager.pending_appeals().len(), 1);

        clock.advance(Duration::hours(2));
        // expired ban no longer shows its appeal in the queue
        assert!(manager.pending_appeals().is_empty());

        manager.cleanup();
        let handle = manager.discipline("p1");
        assert!(handle.lock().appeal.is_none());
    }
}
