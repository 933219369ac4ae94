//! Violation Ledger and Escalation Engine
//!
//! Turns a player's rolling violation history plus punishment history into
//! an escalation level and punishment multiplier.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────┐     ┌───────────────────┐     ┌────────────────────┐
//! │ PlayerEscalationProfile│────►│ EscalationFactors │────►│ EscalationDecision │
//! │ (per-player ledger)    │     │ (1h/24h/7d, trend)│     │ (level, multiplier)│
//! └────────────────────────┘     └───────────────────┘     └────────────────────┘
//!             ▲                            ▲
//!             │                            │
//!    ┌───────────────────┐        PunishmentRecord history
//!    │ EscalationManager │        (owned by BanManager)
//!    └───────────────────┘
//! ```
//!
//! ## Levels
//!
//! - `Critical`: suspicious patterns or 3+ bans
//! - `High`: repeat offender, 10+ violations in the last hour, 2+ recent
//!   punishments, or a harsh punishment record
//! - `Medium` / `Low`: lesser activity thresholds
//! - `None`: everything else
//!
//! The multiplier starts at the level's base value, is scaled by
//! aggravating factors and capped at 5.0.

mod factors;
mod manager;
mod profile;
mod rules;

pub use factors::EscalationFactors;
pub use manager::{EscalationManager, PROFILE_INACTIVITY_DAYS};
pub use profile::{
    PlayerEscalationProfile, HISTORY_RETENTION_DAYS, MAX_VIOLATION_HISTORY, MIN_TREND_SAMPLES,
    PATTERN_SAMPLE_SIZE,
};
pub use rules::{
    determine_level, punishment_multiplier, EscalationDecision, EscalationLevel,
    MAX_DURATION_MULTIPLIER, MAX_PUNISHMENT_MULTIPLIER,
};
