use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuelStatus {
    #[sea_orm(string_value = "WAITING_FOR_PLAYERS")]
    WaitingForPlayers,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl DuelStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DuelStatus::Completed | DuelStatus::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub shortcode: String,
    pub status: DuelStatus,
    #[sea_orm(column_name = "max_rounds")]
    pub max_rounds: Option<i32>,
    #[sea_orm(column_name = "current_round")]
    pub current_round: i32,
    pub wizards: Json,
    pub players: Json,
    pub points: Json,
    #[sea_orm(column_name = "hit_points")]
    pub hit_points: Json,
    #[sea_orm(column_name = "pending_actors")]
    pub pending_actors: Json,
    pub winners: Option<Json>,
    pub losers: Option<Json>,
    #[sea_orm(column_name = "is_campaign")]
    pub is_campaign: bool,
    #[sea_orm(column_name = "created_by")]
    pub created_by: Option<String>,
    #[sea_orm(column_name = "featured_illustration")]
    pub featured_illustration: Option<String>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
    #[sea_orm(column_name = "started_at")]
    pub started_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "ended_at")]
    pub ended_at: Option<OffsetDateTime>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::duel_rounds::Entity")]
    DuelRounds,
}

impl Related<super::duel_rounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DuelRounds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
