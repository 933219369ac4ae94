//! Punishment Authority
//!
//! Decides, issues and reverses punishments.
//!
//! ## Architecture
//!
//! ```text
//! violations ──► BanManager::process_violations
//!                   │
//!                   ├─ active ban?            ──► ALREADY_BANNED
//!                   ├─ HardwareBanRegistry    ──► HARDWARE_BAN (evasion)
//!                   └─ policy rule table      ──► WARNING / TEMPORARY_BAN /
//!                                                 PERMANENT_BAN / HARDWARE_BAN
//!
//! BanAppeal: PENDING ──► APPROVED (ban lifted) | DENIED (ban kept)
//! ```
//!
//! ## Temporary Ban Ladder
//!
//! - 1st temporary ban: 1 hour
//! - 2nd: 24 hours
//! - 3rd and later: 7 days

mod appeal;
mod ban;
mod decision;
mod hardware;
mod manager;
mod policy;
mod record;

pub use appeal::{AppealStatus, BanAppeal};
pub use ban::{format_remaining, BanType, PlayerBan, PERMANENT_DURATION_MS};
pub use decision::{ConnectionCheckResult, DecisionType, PunishmentDecision};
pub use hardware::{fingerprint_digest, HardwareBanRegistry};
pub use manager::{BanManager, EnforcementCounters, MAX_PUNISHMENT_HISTORY};
pub use policy::{
    determine_punishment, synthesize_reason, temporary_ban_duration, total_severity,
    OffenseContext,
};
pub use record::{PunishmentRecord, PunishmentType};
