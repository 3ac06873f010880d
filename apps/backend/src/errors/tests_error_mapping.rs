use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::{AppError, ErrorCode};

#[test]
fn validation_maps_to_400() {
    let app: AppError =
        DomainError::validation(ValidationKind::DuplicateWizard, "wizard listed twice").into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
    assert_eq!(app.status().as_u16(), 400);
}

#[test]
fn not_found_kinds_get_specific_codes() {
    let app: AppError = DomainError::duel_not_found(7).into();
    assert_eq!(app.code(), ErrorCode::DuelNotFound);
    assert_eq!(app.status().as_u16(), 404);

    let app: AppError = DomainError::not_found(NotFoundKind::Round, "missing").into();
    assert_eq!(app.code(), ErrorCode::RoundNotFound);
}

#[test]
fn lifecycle_violations_are_conflicts() {
    for (err, code) in [
        (DomainError::invalid_state("not started"), ErrorCode::InvalidState),
        (DomainError::duplicate_player("p1"), ErrorCode::DuplicatePlayer),
        (DomainError::already_terminal("done"), ErrorCode::AlreadyTerminal),
        (
            DomainError::conflict(ConflictKind::OptimisticLock, "stale"),
            ErrorCode::OptimisticLock,
        ),
    ] {
        let app: AppError = err.into();
        assert_eq!(app.code(), code);
        assert_eq!(app.status().as_u16(), 409);
    }
}

#[test]
fn infra_maps_to_server_errors() {
    let app: AppError = DomainError::infra(InfraErrorKind::DbUnavailable, "down").into();
    assert_eq!(app.code(), ErrorCode::DbUnavailable);
    assert_eq!(app.status().as_u16(), 500);

    let app: AppError = DomainError::infra(InfraErrorKind::DataCorruption, "bad json").into();
    assert_eq!(app.code(), ErrorCode::DataCorruption);
    assert_eq!(app.status().as_u16(), 500);
}
