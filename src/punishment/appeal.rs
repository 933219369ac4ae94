//! Ban Appeals
//!
//! A player holding an active ban may file one appeal at a time. An admin
//! resolves it: approval reverses the ban (and any hardware registration),
//! denial leaves the ban in force. Either way the appeal is closed.
//!
//! An appeal is bound to the ban it was filed against. Once that ban
//! expires or a new ban replaces it, the appeal is discarded and can no
//! longer lift anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditEventType, AuditSeverity};
use crate::error::{EnforcementError, EnforcementResult};
use crate::punishment::ban::{BanType, PlayerBan};
use crate::punishment::manager::BanManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppealStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanAppeal {
    pub id: Uuid,
    pub player_id: String,
    /// The ban as it stood when the appeal was filed
    pub ban: PlayerBan,
    pub reason: String,
    pub contact_info: String,
    pub submitted_at: DateTime<Utc>,
    pub status: AppealStatus,
    pub admin_notes: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl BanAppeal {
    pub fn new(
        ban: PlayerBan,
        reason: String,
        contact_info: String,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: ban.player_id.clone(),
            ban,
            reason,
            contact_info,
            submitted_at,
            status: AppealStatus::Pending,
            admin_notes: None,
            processed_at: None,
        }
    }

    /// Terminal transition out of `Pending`
    fn resolve(mut self, approved: bool, notes: String, at: DateTime<Utc>) -> Self {
        self.status = if approved {
            AppealStatus::Approved
        } else {
            AppealStatus::Denied
        };
        self.admin_notes = Some(notes);
        self.processed_at = Some(at);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == AppealStatus::Pending
    }
}

impl BanManager {
    /// File an appeal against the player's active ban
    pub fn submit_appeal(
        &self,
        player_id: &str,
        reason: &str,
        contact_info: &str,
    ) -> EnforcementResult<BanAppeal> {
        let no_ban = || EnforcementError::NoActiveBan {
            player_id: player_id.to_string(),
        };

        let handle = self.existing_discipline(player_id).ok_or_else(no_ban)?;
        let mut state = handle.lock();
        let now = self.clock.now();

        let ban = state.current_ban(now).cloned().ok_or_else(no_ban)?;
        state.discard_stale_appeal(now);

        if state.appeal.is_some() {
            return Err(EnforcementError::AppealAlreadyPending {
                player_id: player_id.to_string(),
            });
        }

        let appeal = BanAppeal::new(ban, reason.to_string(), contact_info.to_string(), now);
        state.appeal = Some(appeal.clone());
        self.counters.appeals_submitted.fetch_add(1, Ordering::Relaxed);

        info!(player_id = %player_id, appeal_id = %appeal.id, "Appeal submitted");
        self.audit.record(
            AuditEntry::new(
                AuditEventType::AppealSubmitted {
                    player_id: player_id.to_string(),
                },
                AuditSeverity::Info,
                now,
            )
            .with_metadata("appeal_id", &appeal.id.to_string()),
        );

        Ok(appeal)
    }

    /// Approve or deny the player's pending appeal. Returns the closed
    /// appeal.
    pub fn process_appeal(
        &self,
        player_id: &str,
        approved: bool,
        admin_notes: &str,
    ) -> EnforcementResult<BanAppeal> {
        let no_pending = || EnforcementError::NoPendingAppeal {
            player_id: player_id.to_string(),
        };

        let handle = self.existing_discipline(player_id).ok_or_else(no_pending)?;
        let mut state = handle.lock();
        let appeal = state.appeal.take().ok_or_else(no_pending)?;

        let now = self.clock.now();
        let appeal = appeal.resolve(approved, admin_notes.to_string(), now);

        if approved {
            // only the ban the appeal was filed against is reversed
            if state.active_ban.as_ref() == Some(&appeal.ban) {
                state.active_ban = None;
                if appeal.ban.ban_type == BanType::Hardware {
                    self.registry.release(player_id);
                }
            } else {
                warn!(
                    player_id = %player_id,
                    appeal_id = %appeal.id,
                    "Appealed ban no longer in force, current ban left in place"
                );
            }
            self.counters.appeals_approved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.appeals_denied.fetch_add(1, Ordering::Relaxed);
        }

        info!(
            player_id = %player_id,
            appeal_id = %appeal.id,
            status = ?appeal.status,
            "Appeal processed"
        );
        self.audit.record(
            AuditEntry::new(
                AuditEventType::AppealResolved {
                    player_id: player_id.to_string(),
                    status: appeal.status,
                },
                AuditSeverity::Info,
                now,
            )
            .with_metadata("admin_notes", admin_notes),
        );

        Ok(appeal)
    }

    /// Admin queue, oldest first. Appeals whose ban has expired or been
    /// replaced are left out.
    pub fn pending_appeals(&self) -> Vec<BanAppeal> {
        let now = self.clock.now();
        let mut appeals: Vec<BanAppeal> = self
            .discipline_snapshot()
            .iter()
            .filter_map(|handle| handle.lock().live_appeal(now).cloned())
            .collect();
        appeals.sort_by_key(|appeal| appeal.submitted_at);
        appeals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::violation::{Violation, ViolationKind};
    use chrono::Duration;
    use std::sync::Arc;

    fn banned_manager() -> (BanManager, ManualClock) {
        let clock = ManualClock::starting_now();
        let manager = BanManager::with_clock(Arc::new(clock.clone()));
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Aimbot, 0.95)], None)
            .unwrap();
        (manager, clock)
    }

    #[test]
    fn test_submit_requires_active_ban() {
        let (manager, _) = banned_manager();
        let err = manager.submit_appeal("clean", "why", "a@b.c").unwrap_err();
        assert!(matches!(err, EnforcementError::NoActiveBan { .. }));
    }

    #[test]
    fn test_second_submission_rejected() {
        let (manager, _) = banned_manager();
        let appeal = manager.submit_appeal("p1", "mistake", "a@b.c").unwrap();
        assert!(appeal.is_pending());
        assert_eq!(appeal.ban.ban_type, BanType::Permanent);

        let err = manager.submit_appeal("p1", "again", "a@b.c").unwrap_err();
        assert!(matches!(err, EnforcementError::AppealAlreadyPending { .. }));
    }

    #[test]
    fn test_process_without_pending_fails() {
        let (manager, _) = banned_manager();
        assert!(matches!(
            manager.process_appeal("p1", true, "n/a"),
            Err(EnforcementError::NoPendingAppeal { .. })
        ));
        assert!(matches!(
            manager.process_appeal("unknown", false, "n/a"),
            Err(EnforcementError::NoPendingAppeal { .. })
        ));
    }

    #[test]
    fn test_denial_closes_appeal_and_keeps_ban() {
        let (manager, _) = banned_manager();
        manager.submit_appeal("p1", "mistake", "a@b.c").unwrap();

        let closed = manager.process_appeal("p1", false, "evidence is clear").unwrap();
        assert_eq!(closed.status, AppealStatus::Denied);
        assert_eq!(closed.admin_notes.as_deref(), Some("evidence is clear"));
        assert!(closed.processed_at.is_some());
        assert!(manager.is_currently_banned("p1"));

        // a fresh appeal may be filed once the previous one is closed
        assert!(manager.submit_appeal("p1", "new evidence", "a@b.c").is_ok());
    }

    #[test]
    fn test_pending_queue_oldest_first() {
        let (manager, clock) = banned_manager();
        manager
            .process_violations("p2", &[Violation::new(ViolationKind::Fly, 0.95)], None)
            .unwrap();

        manager.submit_appeal("p2", "first", "x").unwrap();
        clock.advance(Duration::minutes(5));
        manager.submit_appeal("p1", "second", "y").unwrap();

        let queue = manager.pending_appeals();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].player_id, "p2");
        assert_eq!(queue[1].player_id, "p1");

        manager.process_appeal("p2", true, "ok").unwrap();
        assert_eq!(manager.pending_appeals().len(), 1);
        assert_eq!(manager.counters().appeals_approved(), 1);
    }
}
