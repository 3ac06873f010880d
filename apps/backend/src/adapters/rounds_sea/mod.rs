//! SeaORM adapter for the duel_rounds table.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::duel_rounds::{self, RoundStatus};

pub mod dto;

pub use dto::{RoundCreate, RoundTransition};

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
) -> Result<Option<duel_rounds::Model>, sea_orm::DbErr> {
    duel_rounds::Entity::find_by_id(round_id).one(conn).await
}

pub async fn require_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
) -> Result<duel_rounds::Model, sea_orm::DbErr> {
    find_by_id(conn, round_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Round not found".to_string()))
}

pub async fn find_by_duel_and_number<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
    round_number: i32,
) -> Result<Option<duel_rounds::Model>, sea_orm::DbErr> {
    duel_rounds::Entity::find()
        .filter(duel_rounds::Column::DuelId.eq(duel_id))
        .filter(duel_rounds::Column::RoundNumber.eq(round_number))
        .one(conn)
        .await
}

/// All rounds of a duel, ordered by round number.
pub async fn find_all_by_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Vec<duel_rounds::Model>, sea_orm::DbErr> {
    duel_rounds::Entity::find()
        .filter(duel_rounds::Column::DuelId.eq(duel_id))
        .order_by_asc(duel_rounds::Column::RoundNumber)
        .all(conn)
        .await
}

/// Highest round number recorded for a duel, if any.
pub async fn latest_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Option<duel_rounds::Model>, sea_orm::DbErr> {
    duel_rounds::Entity::find()
        .filter(duel_rounds::Column::DuelId.eq(duel_id))
        .order_by_desc(duel_rounds::Column::RoundNumber)
        .one(conn)
        .await
}

pub async fn create_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RoundCreate,
) -> Result<duel_rounds::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let completed_at = (dto.status == RoundStatus::Completed).then_some(now);

    let round = duel_rounds::ActiveModel {
        id: sea_orm::NotSet,
        duel_id: Set(dto.duel_id),
        round_number: Set(dto.round_number),
        kind: Set(dto.kind),
        status: Set(dto.status),
        spells: Set(serde_json::json!({})),
        outcome: Set(dto.outcome),
        created_at: Set(now),
        completed_at: Set(completed_at),
    };

    round.insert(conn).await
}

/// Replace the spells map while the round still accepts submissions.
pub async fn write_spells<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
    spells: sea_orm::prelude::Json,
) -> Result<u64, sea_orm::DbErr> {
    let result = duel_rounds::Entity::update_many()
        .col_expr(duel_rounds::Column::Spells, Expr::val(spells).into())
        .filter(duel_rounds::Column::Id.eq(round_id))
        .filter(duel_rounds::Column::Status.eq(RoundStatus::WaitingForSpells))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Conditional status flip. Returns the number of rows affected: `1` when this
/// caller performed the transition, `0` when the round was not in `from`.
pub async fn transition<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RoundTransition,
) -> Result<u64, sea_orm::DbErr> {
    let mut update = duel_rounds::Entity::update_many()
        .col_expr(duel_rounds::Column::Status, Expr::val(dto.to).into());

    if let Some(outcome) = dto.outcome {
        update = update.col_expr(duel_rounds::Column::Outcome, Expr::val(Some(outcome)).into());
    }
    if dto.to == RoundStatus::Completed {
        let now = time::OffsetDateTime::now_utc();
        update = update.col_expr(duel_rounds::Column::CompletedAt, Expr::val(Some(now)).into());
    }

    let result = update
        .filter(duel_rounds::Column::Id.eq(dto.round_id))
        .filter(duel_rounds::Column::Status.eq(dto.from))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Overwrite the stored outcome regardless of status.
pub async fn write_outcome<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
    outcome: sea_orm::prelude::Json,
) -> Result<u64, sea_orm::DbErr> {
    let result = duel_rounds::Entity::update_many()
        .col_expr(duel_rounds::Column::Outcome, Expr::val(Some(outcome)).into())
        .filter(duel_rounds::Column::Id.eq(round_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
