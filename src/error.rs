//! Enforcement error types

use thiserror::Error;

/// Errors raised by enforcement operations.
///
/// These indicate a workflow bug in the caller (appeal misuse, empty
/// violation batches) rather than a player-facing condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnforcementError {
    #[error("no violations supplied for player {player_id}")]
    EmptyViolations { player_id: String },

    #[error("player {player_id} has no active ban to appeal")]
    NoActiveBan { player_id: String },

    #[error("player {player_id} already has a pending appeal")]
    AppealAlreadyPending { player_id: String },

    #[error("player {player_id} has no pending appeal")]
    NoPendingAppeal { player_id: String },
}

pub type EnforcementResult<T> = std::result::Result<T, EnforcementError>;
