use sea_orm::ConnectionTrait;
use serde::Serialize;

use super::DuelFlowService;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::repos::{duels, rounds, Duel, Round};

/// Snapshot of a duel with its rounds in order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelView {
    pub duel: Duel,
    pub rounds: Vec<Round>,
}

impl DuelFlowService {
    pub async fn get_duel<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        duel_id: i64,
    ) -> Result<DuelView, DomainError> {
        let duel = duels::require_duel(conn, duel_id).await?;
        let rounds = rounds::list_for_duel(conn, duel_id).await?;
        Ok(DuelView { duel, rounds })
    }

    pub async fn get_duel_by_shortcode<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        shortcode: &str,
    ) -> Result<DuelView, DomainError> {
        let code = shortcode.trim().to_ascii_uppercase();
        let duel = duels::find_by_shortcode(conn, &code).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Duel, format!("No duel with shortcode {code}"))
        })?;
        let rounds = rounds::list_for_duel(conn, duel.id).await?;
        Ok(DuelView { duel, rounds })
    }

    pub async fn list_rounds<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        duel_id: i64,
    ) -> Result<Vec<Round>, DomainError> {
        duels::require_duel(conn, duel_id).await?;
        rounds::list_for_duel(conn, duel_id).await
    }
}
