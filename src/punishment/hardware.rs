//! Hardware Ban Registry
//!
//! Maps an opaque hardware fingerprint to the players banned under it.
//! Used only for evasion detection; bans themselves live in the
//! per-player state owned by [`BanManager`](crate::punishment::BanManager).
//!
//! Two indexes are kept:
//! - `members`: fingerprint -> players registered under it
//! - `holders`: player -> fingerprint, for players currently holding a
//!   hardware ban
//!
//! Both are written inside the issuing or lifting player's critical
//! section, so the evasion check never needs another player's lock.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct HardwareBanRegistry {
    members: DashMap<String, HashSet<String>>,
    holders: DashMap<String, String>,
}

impl HardwareBanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `player_id` holds a hardware ban under `fingerprint`
    pub fn register(&self, fingerprint: &str, player_id: &str) {
        self.members
            .entry(fingerprint.to_string())
            .or_default()
            .insert(player_id.to_string());
        self.holders
            .insert(player_id.to_string(), fingerprint.to_string());
    }

    /// Remove a player's hardware ban registration, pruning the
    /// fingerprint entry if it becomes empty. Returns the fingerprint.
    pub fn release(&self, player_id: &str) -> Option<String> {
        let (_, fingerprint) = self.holders.remove(player_id)?;

        if let Some(mut players) = self.members.get_mut(&fingerprint) {
            players.remove(player_id);
        }
        self.members
            .remove_if(&fingerprint, |_, players| players.is_empty());

        Some(fingerprint)
    }

    /// Another player registered under `fingerprint` who currently holds a
    /// hardware ban, if any. Lowest player ID wins when several match.
    pub fn find_banned_peer(&self, fingerprint: &str, player_id: &str) -> Option<String> {
        let candidates: Vec<String> = match self.members.get(fingerprint) {
            Some(players) => players.iter().cloned().collect(),
            None => return None,
        };

        candidates
            .into_iter()
            .filter(|other| other != player_id)
            .filter(|other| {
                self.holders
                    .get(other)
                    .is_some_and(|held| held.value() == fingerprint)
            })
            .min()
    }

    /// Snapshot of every `(fingerprint, player)` pair
    pub fn memberships(&self) -> Vec<(String, String)> {
        self.members
            .iter()
            .flat_map(|entry| {
                let fingerprint = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(move |player| (fingerprint.clone(), player.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Remove one membership. The caller holds the player's lock.
    pub fn unregister(&self, fingerprint: &str, player_id: &str) -> bool {
        let removed = self
            .members
            .get_mut(fingerprint)
            .is_some_and(|mut players| players.remove(player_id));
        self.holders
            .remove_if(player_id, |_, held| held == fingerprint);
        removed
    }

    /// Drop fingerprints with no members left; returns how many went
    pub fn drop_empty(&self) -> usize {
        let before = self.members.len();
        self.members.retain(|_, players| !players.is_empty());
        before - self.members.len()
    }

    pub fn is_registered(&self, fingerprint: &str, player_id: &str) -> bool {
        self.members
            .get(fingerprint)
            .is_some_and(|players| players.contains(player_id))
    }

    pub fn players_for(&self, fingerprint: &str) -> Vec<String> {
        let mut players: Vec<String> = self
            .members
            .get(fingerprint)
            .map(|players| players.iter().cloned().collect())
            .unwrap_or_default();
        players.sort();
        players
    }

    pub fn fingerprint_count(&self) -> usize {
        self.members.len()
    }
}

/// Short digest for logs and audit entries; raw fingerprints are never logged
pub fn fingerprint_digest(fingerprint: &str) -> String {
    let digest = Sha256::digest(fingerprint.as_bytes());
    hex::encode(&digest[..6])
}
