//! Escalation Manager
//!
//! Owns the per-player escalation profiles and turns a violation batch
//! plus punishment history into an [`EscalationDecision`].
//!
//! Each profile sits behind its own mutex so concurrent detector threads
//! reporting on the same player never lose updates, while different
//! players proceed in parallel.

use chrono::Duration;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{system_clock, SharedClock};
use crate::escalation::factors::EscalationFactors;
use crate::escalation::profile::PlayerEscalationProfile;
use crate::escalation::rules::EscalationDecision;
use crate::punishment::PunishmentRecord;
use crate::violation::Violation;

/// Profiles idle this long with no retained violations are collected
pub const PROFILE_INACTIVITY_DAYS: i64 = 30;

struct ProfileSlot {
    profile: PlayerEscalationProfile,
    /// Set when cleanup unlinks the slot; writers must re-fetch
    retired: bool,
}

type SharedSlot = Arc<Mutex<ProfileSlot>>;

pub struct EscalationManager {
    profiles: DashMap<String, SharedSlot>,
    clock: SharedClock,
}

impl Default for EscalationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationManager {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            profiles: DashMap::new(),
            clock,
        }
    }

    fn slot(&self, player_id: &str) -> SharedSlot {
        if let Some(slot) = self.profiles.get(player_id) {
            return slot.value().clone();
        }

        let now = self.clock.now();
        self.profiles
            .entry(player_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(ProfileSlot {
                    profile: PlayerEscalationProfile::new(player_id.to_string(), now),
                    retired: false,
                }))
            })
            .value()
            .clone()
    }

    /// Run `f` on the player's live profile, creating it if absent
    fn with_profile<R>(
        &self,
        player_id: &str,
        mut f: impl FnMut(&mut PlayerEscalationProfile) -> R,
    ) -> R {
        loop {
            let slot = self.slot(player_id);
            let mut guard = slot.lock();
            if guard.retired {
                continue;
            }
            return f(&mut guard.profile);
        }
    }

    /// Feed `new_violations` into the player's ledger and evaluate
    /// escalation against `punishment_history`.
    pub fn evaluate_escalation(
        &self,
        player_id: &str,
        new_violations: &[Violation],
        punishment_history: &[PunishmentRecord],
    ) -> EscalationDecision {
        let decision = self.with_profile(player_id, |profile| {
            let now = self.clock.now();
            profile.add_violations(new_violations, now);
            let factors = EscalationFactors::compute(profile, punishment_history, now);
            EscalationDecision::from_factors(factors, now)
        });

        debug!(
            player_id = %player_id,
            level = ?decision.level,
            multiplier = decision.punishment_multiplier,
            immediate = decision.requires_immediate_action(),
            "Evaluated escalation"
        );

        decision
    }

    /// Absorb violations without evaluating
    pub fn record_violations(&self, player_id: &str, violations: &[Violation]) {
        self.with_profile(player_id, |profile| {
            profile.add_violations(violations, self.clock.now());
        });
    }

    pub fn profile_snapshot(&self, player_id: &str) -> Option<PlayerEscalationProfile> {
        let slot = self.profiles.get(player_id)?.value().clone();
        let guard = slot.lock();
        Some(guard.profile.clone())
    }

    pub fn profiles_snapshot(&self) -> Vec<PlayerEscalationProfile> {
        let slots: Vec<SharedSlot> = self.profiles.iter().map(|e| e.value().clone()).collect();
        slots.iter().map(|slot| slot.lock().profile.clone()).collect()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    /// Purge expired entries everywhere and drop profiles idle for
    /// [`PROFILE_INACTIVITY_DAYS`] with nothing retained. Returns the
    /// number of profiles removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let max_idle = Duration::days(PROFILE_INACTIVITY_DAYS);

        let snapshot: Vec<(String, SharedSlot)> = self
            .profiles
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut stale = Vec::new();
        for (player_id, slot) in snapshot {
            let mut guard = slot.lock();
            guard.profile.purge_expired(now);
            if guard.profile.is_stale(now, max_idle) {
                stale.push(player_id);
            }
        }

        let mut removed = 0;
        for player_id in stale {
            let unlinked = self.profiles.remove_if(&player_id, |_, slot| {
                let mut guard = slot.lock();
                if guard.profile.is_stale(now, max_idle) {
                    guard.retired = true;
                    true
                } else {
                    false
                }
            });
            if unlinked.is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed = removed, "Removed inactive escalation profiles");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::escalation::EscalationLevel;
    use crate::violation::ViolationKind;

    fn manager() -> (EscalationManager, ManualClock) {
        let clock = ManualClock::starting_now();
        (EscalationManager::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_profile_created_lazily() {
        let (manager, _) = manager();
        assert!(manager.profile_snapshot("p1").is_none());

        manager.evaluate_escalation("p1", &[Violation::new(ViolationKind::Fly, 0.2)], &[]);

        let profile = manager.profile_snapshot("p1").unwrap();
        assert_eq!(profile.total_violations(), 1);
        assert_eq!(manager.profile_count(), 1);
    }

    #[test]
    fn test_single_violation_is_none() {
        let (manager, _) = manager();
        let decision =
            manager.evaluate_escalation("p1", &[Violation::new(ViolationKind::Reach, 0.2)], &[]);

        assert_eq!(decision.level, EscalationLevel::None);
        assert_eq!(decision.punishment_multiplier, 1.0);
    }

    #[test]
    fn test_cleanup_removes_only_stale_profiles() {
        let (manager, clock) = manager();
        manager.record_violations("old", &[Violation::new(ViolationKind::Fly, 0.2)]);
        clock.advance(Duration::days(25));
        manager.record_violations("recent", &[Violation::new(ViolationKind::Fly, 0.2)]);
        clock.advance(Duration::days(6));

        assert_eq!(manager.cleanup(), 1);
        assert!(manager.profile_snapshot("old").is_none());
        assert!(manager.profile_snapshot("recent").is_some());
    }

    #[test]
    fn test_writes_after_cleanup_land_in_fresh_profile() {
        let (manager, clock) = manager();
        manager.record_violations("p1", &[Violation::new(ViolationKind::Fly, 0.2)]);
        clock.advance(Duration::days(31));
        manager.cleanup();

        manager.record_violations("p1", &[Violation::new(ViolationKind::Reach, 0.2)]);
        let profile = manager.profile_snapshot("p1").unwrap();
        assert_eq!(profile.total_violations(), 1);
    }
}
