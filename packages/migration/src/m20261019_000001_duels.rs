use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Duels {
    Table,
    Id,
    Shortcode,
    Status,
    MaxRounds,
    CurrentRound,
    Wizards,
    Players,
    Points,
    HitPoints,
    PendingActors,
    Winners,
    Losers,
    IsCampaign,
    CreatedBy,
    FeaturedIllustration,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    EndedAt,
    Version,
}

#[derive(Iden)]
enum DuelRounds {
    Table,
    Id,
    DuelId,
    RoundNumber,
    Kind,
    Status,
    Spells,
    Outcome,
    CreatedAt,
    CompletedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // duels
        manager
            .create_table(
                Table::create()
                    .table(Duels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Duels::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Duels::Shortcode).string_len(6).not_null())
                    .col(
                        ColumnDef::new(Duels::Status)
                            .string_len(32)
                            .not_null()
                            .default("WAITING_FOR_PLAYERS"),
                    )
                    // NULL means the duel runs until only one wizard is left standing
                    .col(ColumnDef::new(Duels::MaxRounds).integer().null())
                    .col(
                        ColumnDef::new(Duels::CurrentRound)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Duels::Wizards).json().not_null())
                    .col(ColumnDef::new(Duels::Players).json().not_null())
                    .col(ColumnDef::new(Duels::Points).json().not_null())
                    .col(ColumnDef::new(Duels::HitPoints).json().not_null())
                    .col(ColumnDef::new(Duels::PendingActors).json().not_null())
                    .col(ColumnDef::new(Duels::Winners).json().null())
                    .col(ColumnDef::new(Duels::Losers).json().null())
                    .col(
                        ColumnDef::new(Duels::IsCampaign)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Duels::CreatedBy).string().null())
                    .col(ColumnDef::new(Duels::FeaturedIllustration).string().null())
                    .col(
                        ColumnDef::new(Duels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Duels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Duels::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Duels::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Duels::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_duels_shortcode")
                    .table(Duels::Table)
                    .col(Duels::Shortcode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // duel_rounds
        manager
            .create_table(
                Table::create()
                    .table(DuelRounds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DuelRounds::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DuelRounds::DuelId).big_integer().not_null())
                    .col(ColumnDef::new(DuelRounds::RoundNumber).integer().not_null())
                    .col(ColumnDef::new(DuelRounds::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(DuelRounds::Status).string_len(32).not_null())
                    .col(ColumnDef::new(DuelRounds::Spells).json().not_null())
                    .col(ColumnDef::new(DuelRounds::Outcome).json().null())
                    .col(
                        ColumnDef::new(DuelRounds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DuelRounds::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_duel_rounds_duel_id")
                            .from(DuelRounds::Table, DuelRounds::DuelId)
                            .to(Duels::Table, Duels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Round numbers are contiguous per duel; the pair is unique.
        manager
            .create_index(
                Index::create()
                    .name("ux_duel_rounds_duel_round_number")
                    .table(DuelRounds::Table)
                    .col(DuelRounds::DuelId)
                    .col(DuelRounds::RoundNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DuelRounds::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Duels::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
