//! SeaORM -> DomainError translation.

use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::web::trace_ctx;

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

fn is_unique_violation(msg: &str) -> bool {
    mentions_sqlstate(msg, "23505")
        || msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

/// Constraint names (Postgres) and table.column pairs (SQLite) with a domain meaning.
fn unique_violation_to_conflict(msg: &str) -> Option<(ConflictKind, &'static str)> {
    if msg.contains("ux_duels_shortcode") || msg.contains("duels.shortcode") {
        return Some((
            ConflictKind::Other("ShortcodeTaken".into()),
            "Shortcode already in use",
        ));
    }
    if msg.contains("ux_duel_rounds_duel_round_number")
        || msg.contains("duel_rounds.duel_id, duel_rounds.round_number")
    {
        return Some((
            ConflictKind::Other("RoundExists".into()),
            "Round number already exists for this duel",
        ));
    }
    None
}

#[derive(serde::Deserialize)]
struct LockInfo {
    expected: i32,
    actual: i32,
}

pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(what) => {
            let kind = if what.starts_with("Duel") {
                NotFoundKind::Duel
            } else if what.starts_with("Round") {
                NotFoundKind::Round
            } else {
                NotFoundKind::Other("Record".into())
            };
            return DomainError::not_found(kind, what.clone());
        }
        sea_orm::DbErr::Custom(custom) if custom.starts_with("OPTIMISTIC_LOCK:") => {
            let info = custom
                .strip_prefix("OPTIMISTIC_LOCK:")
                .and_then(|json| serde_json::from_str::<LockInfo>(json).ok());
            return match info {
                Some(info) => {
                    warn!(
                        trace_id = %trace_id,
                        expected = info.expected,
                        actual = info.actual,
                        "Optimistic lock conflict"
                    );
                    DomainError::conflict(
                        ConflictKind::OptimisticLock,
                        format!(
                            "Duel was modified concurrently (expected version {}, actual {})",
                            info.expected, info.actual
                        ),
                    )
                }
                None => DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    "Duel was modified concurrently",
                ),
            };
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %msg, "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if is_unique_violation(&msg) {
        warn!(trace_id = %trace_id, raw_error = %msg, "Unique constraint violation");
        if let Some((kind, detail)) = unique_violation_to_conflict(&msg) {
            return DomainError::conflict(kind, detail);
        }
        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if msg.contains("timeout") || msg.contains("pool timed out") {
        warn!(trace_id = %trace_id, raw_error = %msg, "Database timeout");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %msg, "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e)
    }
}
