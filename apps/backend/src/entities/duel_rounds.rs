use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundKind {
    #[sea_orm(string_value = "SPELL_CASTING")]
    SpellCasting,
    #[sea_orm(string_value = "COUNTER_SPELL")]
    CounterSpell,
    #[sea_orm(string_value = "FINAL_ROUND")]
    FinalRound,
    #[sea_orm(string_value = "CONCLUSION")]
    Conclusion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    #[sea_orm(string_value = "WAITING_FOR_SPELLS")]
    WaitingForSpells,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "duel_rounds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "duel_id")]
    pub duel_id: i64,
    #[sea_orm(column_name = "round_number")]
    pub round_number: i32,
    pub kind: RoundKind,
    pub status: RoundStatus,
    pub spells: Json,
    pub outcome: Option<Json>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "completed_at")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::duels::Entity",
        from = "Column::DuelId",
        to = "super::duels::Column::Id"
    )]
    Duel,
}

impl Related<super::duels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Duel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
