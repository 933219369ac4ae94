//! Fairplay Enforcer
//!
//! Punishment and escalation decision engine for anti-cheat enforcement.
//! Turns a stream of detected violations into graduated enforcement
//! actions, tracks each player's disciplinary history, detects ban
//! evasion and runs an appeals workflow.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs          - Crate root with re-exports
//! ├── main.rs         - NDJSON host harness
//! ├── config.rs       - Configuration management
//! ├── clock.rs        - Injectable time source
//! ├── error.rs        - Enforcement error types
//! ├── audit.rs        - Bounded enforcement audit trail
//! ├── violation.rs    - Violation input types
//! ├── escalation/     - Violation ledger & escalation engine
//! │   ├── profile.rs  - Per-player rolling violation history
//! │   ├── factors.rs  - Escalation factor snapshot
//! │   ├── rules.rs    - Level / multiplier rule tables
//! │   └── manager.rs  - Profile store & evaluation
//! ├── punishment/     - Punishment authority
//! │   ├── ban.rs      - Active bans & expiry
//! │   ├── record.rs   - Punishment history records
//! │   ├── policy.rs   - Severity aggregation & punishment rules
//! │   ├── decision.rs - Decisions & connection checks
//! │   ├── hardware.rs - Hardware ban registry
//! │   ├── appeal.rs   - Appeal workflow
//! │   └── manager.rs  - Ban manager
//! ├── reporting.rs    - Statistics, risk & health scores
//! └── maintenance.rs  - Periodic cleanup task
//! ```

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod escalation;
pub mod maintenance;
pub mod punishment;
pub mod reporting;
pub mod violation;

// Re-export main types for convenience
pub use audit::{AuditEntry, AuditEventType, AuditLog, AuditSeverity};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::EnforcerConfig;
pub use error::{EnforcementError, EnforcementResult};
pub use maintenance::{spawn_maintenance, MaintenanceReport};
pub use violation::{Violation, ViolationEntry, ViolationKind};

// Re-export escalation types
pub use escalation::{
    EscalationDecision, EscalationFactors, EscalationLevel, EscalationManager,
    PlayerEscalationProfile,
};

// Re-export punishment types
pub use punishment::{
    AppealStatus, BanAppeal, BanManager, BanType, ConnectionCheckResult, DecisionType,
    HardwareBanRegistry, PlayerBan, PunishmentDecision, PunishmentRecord, PunishmentType,
};

// Re-export reporting types
pub use reporting::{
    BanStatistics, EscalationStatistics, PunishmentSystemStatistics, RiskLevel,
};
