//! Error codes for the duel API.
//!
//! Every code is SCREAMING_SNAKE_CASE and maps 1:1 to the string that appears
//! in problem-details responses. Add new codes here; never pass ad-hoc strings.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    ValidationError,
    BadRequest,
    InvalidHeader,
    InvalidDuelId,
    InvalidRoundId,

    // Not found
    DuelNotFound,
    RoundNotFound,
    WizardNotFound,
    NotFound,

    // Lifecycle conflicts
    InvalidState,
    DuplicatePlayer,
    AlreadyTerminal,
    OptimisticLock,
    ShortcodeExhausted,
    Conflict,

    // System
    DbError,
    DbUnavailable,
    DbTimeout,
    DataCorruption,
    CollaboratorFailure,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::InvalidDuelId => "INVALID_DUEL_ID",
            Self::InvalidRoundId => "INVALID_ROUND_ID",

            Self::DuelNotFound => "DUEL_NOT_FOUND",
            Self::RoundNotFound => "ROUND_NOT_FOUND",
            Self::WizardNotFound => "WIZARD_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::InvalidState => "INVALID_STATE",
            Self::DuplicatePlayer => "DUPLICATE_PLAYER",
            Self::AlreadyTerminal => "ALREADY_TERMINAL",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::ShortcodeExhausted => "SHORTCODE_EXHAUSTED",
            Self::Conflict => "CONFLICT",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::CollaboratorFailure => "COLLABORATOR_FAILURE",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
