//! Domain-level error type used across services, repos and the job pipeline.
//!
//! HTTP- and DB-agnostic. Handlers return `Result<T, crate::error::AppError>`
//! and convert via `From<DomainError> for AppError`.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Collaborator,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Duel,
    Round,
    Wizard,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    OptimisticLock,
    ShortcodeExhausted,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    EmptyRoster,
    DuplicateWizard,
    InvalidRoundLimit,
    EmptySpell,
    UnknownWizard,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Malformed input.
    Validation(ValidationKind, String),
    /// Referenced duel, round or wizard does not exist.
    NotFound(NotFoundKind, String),
    /// Operation attempted in the wrong lifecycle state; re-read before retrying.
    InvalidState(String),
    /// Player already present in the duel.
    DuplicatePlayer(String),
    /// Duel already completed.
    AlreadyTerminal(String),
    Conflict(ConflictKind, String),
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation error {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::InvalidState(d) => write!(f, "invalid state: {d}"),
            DomainError::DuplicatePlayer(d) => write!(f, "duplicate player: {d}"),
            DomainError::AlreadyTerminal(d) => write!(f, "already terminal: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::InvalidState(detail.into())
    }
    pub fn duplicate_player(detail: impl Into<String>) -> Self {
        Self::DuplicatePlayer(detail.into())
    }
    pub fn already_terminal(detail: impl Into<String>) -> Self {
        Self::AlreadyTerminal(detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }

    pub fn duel_not_found(duel_id: i64) -> Self {
        Self::not_found(NotFoundKind::Duel, format!("Duel {duel_id} not found"))
    }
    pub fn round_not_found(detail: impl Into<String>) -> Self {
        Self::not_found(NotFoundKind::Round, detail)
    }

    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, DomainError::Conflict(ConflictKind::OptimisticLock, _))
    }
}
