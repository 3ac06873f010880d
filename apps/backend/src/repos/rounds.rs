//! Round repository: typed domain model over the `duel_rounds` table.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::rounds_sea::{self as rounds_adapter, RoundCreate, RoundTransition};
use crate::domain::{RoundKind, RoundOutcome, RoundStatus, Spells};
use crate::entities::duel_rounds;
use crate::errors::domain::DomainError;
use crate::repos::json::{decode, decode_opt, encode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: i64,
    pub duel_id: i64,
    pub round_number: u32,
    pub kind: RoundKind,
    pub status: RoundStatus,
    pub spells: Spells,
    pub outcome: Option<RoundOutcome>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl Round {
    pub fn illustration(&self) -> Option<&crate::domain::ImageRef> {
        self.outcome.as_ref()?.illustration_ref.as_ref()
    }
}

impl TryFrom<duel_rounds::Model> for Round {
    type Error = DomainError;

    fn try_from(model: duel_rounds::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            duel_id: model.duel_id,
            round_number: u32::try_from(model.round_number).unwrap_or_default(),
            kind: model.kind,
            status: model.status,
            spells: decode("spells", model.spells)?,
            outcome: decode_opt("outcome", model.outcome)?,
            created_at: model.created_at,
            completed_at: model.completed_at,
        })
    }
}

fn to_column(round_number: u32) -> i32 {
    i32::try_from(round_number).unwrap_or(i32::MAX)
}

fn collect(models: Vec<duel_rounds::Model>) -> Result<Vec<Round>, DomainError> {
    models.into_iter().map(Round::try_from).collect()
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
) -> Result<Option<Round>, DomainError> {
    rounds_adapter::find_by_id(conn, round_id)
        .await?
        .map(Round::try_from)
        .transpose()
}

pub async fn require_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
) -> Result<Round, DomainError> {
    find_by_id(conn, round_id)
        .await?
        .ok_or_else(|| DomainError::round_not_found(format!("Round {round_id} not found")))
}

pub async fn find_by_duel_and_number<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
    round_number: u32,
) -> Result<Option<Round>, DomainError> {
    rounds_adapter::find_by_duel_and_number(conn, duel_id, to_column(round_number))
        .await?
        .map(Round::try_from)
        .transpose()
}

/// All rounds for a duel ordered by round number.
pub async fn list_for_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Vec<Round>, DomainError> {
    collect(rounds_adapter::find_all_by_duel(conn, duel_id).await?)
}

pub async fn latest_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Option<Round>, DomainError> {
    rounds_adapter::latest_round(conn, duel_id)
        .await?
        .map(Round::try_from)
        .transpose()
}

/// Insert a round. `outcome` is only recorded for rounds created already resolved.
pub async fn create_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
    round_number: u32,
    kind: RoundKind,
    status: RoundStatus,
    outcome: Option<&RoundOutcome>,
) -> Result<Round, DomainError> {
    let mut dto =
        RoundCreate::open(duel_id, to_column(round_number), kind).with_status(status);
    if let Some(outcome) = outcome {
        dto = dto.with_outcome(encode(outcome)?);
    }
    Round::try_from(rounds_adapter::create_round(conn, dto).await?)
}

/// Persist spells while the round is open. Returns false if it was already closed.
pub async fn write_spells<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
    spells: &Spells,
) -> Result<bool, DomainError> {
    Ok(rounds_adapter::write_spells(conn, round_id, encode(spells)?).await? == 1)
}

/// Conditional status flip; true iff this caller performed it.
pub async fn transition<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
    from: RoundStatus,
    to: RoundStatus,
    outcome: Option<&RoundOutcome>,
) -> Result<bool, DomainError> {
    let mut dto = RoundTransition::new(round_id, from, to);
    if let Some(outcome) = outcome {
        dto = dto.with_outcome(encode(outcome)?);
    }
    Ok(rounds_adapter::transition(conn, dto).await? == 1)
}

pub async fn write_outcome<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    round_id: i64,
    outcome: &RoundOutcome,
) -> Result<(), DomainError> {
    match rounds_adapter::write_outcome(conn, round_id, encode(outcome)?).await? {
        0 => Err(DomainError::round_not_found(format!(
            "Round {round_id} not found"
        ))),
        _ => Ok(()),
    }
}
