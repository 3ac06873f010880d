//! SeaORM adapter for the duels table - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entities::duels::{self, DuelStatus};

pub mod dto;

pub use dto::{DuelCreate, DuelUpdate};

// Adapter functions return DbErr; the repos layer maps to DomainError.

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Option<duels::Model>, sea_orm::DbErr> {
    duels::Entity::find_by_id(duel_id).one(conn).await
}

pub async fn require_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<duels::Model, sea_orm::DbErr> {
    find_by_id(conn, duel_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Duel not found".to_string()))
}

pub async fn find_by_shortcode<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    shortcode: &str,
) -> Result<Option<duels::Model>, sea_orm::DbErr> {
    duels::Entity::find()
        .filter(duels::Column::Shortcode.eq(shortcode))
        .one(conn)
        .await
}

pub async fn shortcode_exists<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    shortcode: &str,
) -> Result<bool, sea_orm::DbErr> {
    let count = duels::Entity::find()
        .filter(duels::Column::Shortcode.eq(shortcode))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn create_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: DuelCreate,
) -> Result<duels::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let duel = duels::ActiveModel {
        id: NotSet,
        shortcode: Set(dto.shortcode),
        status: Set(DuelStatus::WaitingForPlayers),
        max_rounds: Set(dto.max_rounds),
        current_round: Set(1),
        wizards: Set(dto.wizards),
        players: Set(dto.players),
        points: Set(dto.points),
        hit_points: Set(dto.hit_points),
        pending_actors: Set(dto.pending_actors),
        winners: Set(None),
        losers: Set(None),
        is_campaign: Set(dto.is_campaign),
        created_by: Set(dto.created_by),
        featured_illustration: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        started_at: Set(None),
        ended_at: Set(None),
        version: Set(1),
    };

    duel.insert(conn).await
}

/// Apply an optimistic update, then refetch.
///
/// Zero affected rows means either the duel is gone (`RecordNotFound`) or the
/// version moved on (`OPTIMISTIC_LOCK:` custom payload).
pub async fn update_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: DuelUpdate,
) -> Result<duels::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let mut update = duels::Entity::update_many()
        .col_expr(duels::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            duels::Column::Version,
            Expr::col(duels::Column::Version).add(1),
        );

    if let Some(status) = dto.status {
        update = update.col_expr(duels::Column::Status, Expr::val(status).into());
    }
    if let Some(round) = dto.current_round {
        update = update.col_expr(duels::Column::CurrentRound, Expr::val(round).into());
    }
    if let Some(wizards) = dto.wizards {
        update = update.col_expr(duels::Column::Wizards, Expr::val(wizards).into());
    }
    if let Some(players) = dto.players {
        update = update.col_expr(duels::Column::Players, Expr::val(players).into());
    }
    if let Some(points) = dto.points {
        update = update.col_expr(duels::Column::Points, Expr::val(points).into());
    }
    if let Some(hit_points) = dto.hit_points {
        update = update.col_expr(duels::Column::HitPoints, Expr::val(hit_points).into());
    }
    if let Some(pending) = dto.pending_actors {
        update = update.col_expr(duels::Column::PendingActors, Expr::val(pending).into());
    }
    if let Some(winners) = dto.winners {
        update = update.col_expr(duels::Column::Winners, Expr::val(Some(winners)).into());
    }
    if let Some(losers) = dto.losers {
        update = update.col_expr(duels::Column::Losers, Expr::val(Some(losers)).into());
    }
    if let Some(at) = dto.started_at {
        update = update.col_expr(duels::Column::StartedAt, Expr::val(Some(at)).into());
    }
    if let Some(at) = dto.ended_at {
        update = update.col_expr(duels::Column::EndedAt, Expr::val(Some(at)).into());
    }

    let result = update
        .filter(duels::Column::Id.eq(dto.id))
        .filter(duels::Column::Version.eq(dto.expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match find_by_id(conn, dto.id).await? {
            Some(current) => Err(sea_orm::DbErr::Custom(format!(
                "OPTIMISTIC_LOCK:{{\"expected\":{},\"actual\":{}}}",
                dto.expected_version, current.version
            ))),
            None => Err(sea_orm::DbErr::RecordNotFound(
                "Duel not found".to_string(),
            )),
        };
    }

    require_duel(conn, dto.id).await
}

/// Set the featured illustration. Not version-guarded: it never races state
/// transitions and is written from the illustration job.
pub async fn set_featured_illustration<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
    image_ref: &str,
) -> Result<u64, sea_orm::DbErr> {
    let result = duels::Entity::update_many()
        .col_expr(
            duels::Column::FeaturedIllustration,
            Expr::val(Some(image_ref.to_string())).into(),
        )
        .filter(duels::Column::Id.eq(duel_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
