//! Active bans
//!
//! Temporary bans expire once `now > issued_at + duration`. Permanent and
//! hardware bans carry the `-1` duration sentinel and only end through an
//! appeal or an admin lift.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Duration sentinel for bans that never expire
pub const PERMANENT_DURATION_MS: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BanType {
    Temporary,
    Permanent,
    Hardware,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBan {
    pub player_id: String,
    pub ban_type: BanType,
    pub reason: String,
    pub duration_ms: i64,
    pub issued_at: DateTime<Utc>,
    /// Present only for hardware bans issued with a known fingerprint
    pub hardware_fingerprint: Option<String>,
}

impl PlayerBan {
    pub fn temporary(
        player_id: String,
        reason: String,
        duration: Duration,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id,
            ban_type: BanType::Temporary,
            reason,
            duration_ms: duration.num_milliseconds(),
            issued_at,
            hardware_fingerprint: None,
        }
    }

    pub fn permanent(player_id: String, reason: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            player_id,
            ban_type: BanType::Permanent,
            reason,
            duration_ms: PERMANENT_DURATION_MS,
            issued_at,
            hardware_fingerprint: None,
        }
    }

    pub fn hardware(
        player_id: String,
        reason: String,
        fingerprint: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id,
            ban_type: BanType::Hardware,
            reason,
            duration_ms: PERMANENT_DURATION_MS,
            issued_at,
            hardware_fingerprint: fingerprint,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.duration_ms == PERMANENT_DURATION_MS
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.is_permanent() {
            None
        } else {
            Some(self.issued_at + Duration::milliseconds(self.duration_ms))
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|until| now > until)
    }

    /// Milliseconds left; -1 for non-expiring bans
    pub fn remaining_time_ms(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at() {
            None => PERMANENT_DURATION_MS,
            Some(until) => (until - now).num_milliseconds().max(0),
        }
    }
}

/// Render a remaining duration as e.g. `2d 3h 15m`
pub fn format_remaining(ms: i64) -> String {
    if ms < 0 {
        return "permanent".to_string();
    }

    let total_minutes = ms / 60_000;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "less than a minute".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ban_expiry() {
        let issued = Utc::now();
        let ban =
            PlayerBan::temporary("p".to_string(), "r".to_string(), Duration::hours(1), issued);

        assert!(!ban.is_expired(issued + Duration::hours(1)));
        assert!(ban.is_expired(issued + Duration::hours(1) + Duration::milliseconds(1)));
        assert_eq!(ban.remaining_time_ms(issued + Duration::minutes(30)), 30 * 60_000);
        assert_eq!(ban.remaining_time_ms(issued + Duration::hours(2)), 0);
    }

    #[test]
    fn test_permanent_bans_never_expire() {
        let issued = Utc::now() - Duration::days(3650);
        let perm = PlayerBan::permanent("p".to_string(), "r".to_string(), issued);
        let hw = PlayerBan::hardware(
            "p".to_string(),
            "r".to_string(),
            Some("fp".to_string()),
            issued,
        );

        assert!(!perm.is_expired(Utc::now()));
        assert!(!hw.is_expired(Utc::now()));
        assert_eq!(perm.remaining_time_ms(Utc::now()), -1);
        assert_eq!(hw.expires_at(), None);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(-1), "permanent");
        assert_eq!(format_remaining(30_000), "less than a minute");
        assert_eq!(format_remaining(45 * 60_000), "45m");
        assert_eq!(format_remaining((2 * 60 + 5) * 60_000), "2h 5m");
        assert_eq!(format_remaining(((24 + 3) * 60 + 15) * 60_000), "1d 3h 15m");
    }
}
