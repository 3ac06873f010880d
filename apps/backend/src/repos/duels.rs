//! Duel repository: typed domain model over the `duels` table.

use std::collections::BTreeSet;

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::duels_sea::{self as duels_adapter, DuelCreate, DuelUpdate};
use crate::domain::{
    DuelStatus, HitPoints, ImageRef, PlayerId, Points, RoundLimit, UserId, WizardId,
};
use crate::entities::duels;
use crate::errors::domain::DomainError;
use crate::repos::json::{decode, decode_opt, encode};

/// Duel domain model, decoded from `duels::Model`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Duel {
    pub id: i64,
    pub shortcode: String,
    pub status: DuelStatus,
    pub round_limit: RoundLimit,
    pub current_round: u32,
    pub wizards: Vec<WizardId>,
    pub players: Vec<PlayerId>,
    pub points: Points,
    pub hit_points: HitPoints,
    pub pending_actors: BTreeSet<WizardId>,
    pub winners: Option<Vec<WizardId>>,
    pub losers: Option<Vec<WizardId>>,
    pub is_campaign: bool,
    pub created_by: Option<UserId>,
    pub featured_illustration: Option<ImageRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    #[serde(skip)]
    pub version: i32,
}

impl Duel {
    pub fn has_wizard(&self, wizard: &WizardId) -> bool {
        self.wizards.contains(wizard)
    }
}

impl TryFrom<duels::Model> for Duel {
    type Error = DomainError;

    fn try_from(model: duels::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            shortcode: model.shortcode,
            status: model.status,
            round_limit: RoundLimit::from_max_rounds(model.max_rounds),
            current_round: u32::try_from(model.current_round).unwrap_or(1),
            wizards: decode("wizards", model.wizards)?,
            players: decode("players", model.players)?,
            points: decode("points", model.points)?,
            hit_points: decode("hit_points", model.hit_points)?,
            pending_actors: decode("pending_actors", model.pending_actors)?,
            winners: decode_opt("winners", model.winners)?,
            losers: decode_opt("losers", model.losers)?,
            is_campaign: model.is_campaign,
            created_by: model.created_by.map(UserId::from),
            featured_illustration: model.featured_illustration.map(ImageRef::from),
            created_at: model.created_at,
            updated_at: model.updated_at,
            started_at: model.started_at,
            ended_at: model.ended_at,
            version: model.version,
        })
    }
}

/// Input for inserting a duel; scores start at their defaults.
#[derive(Debug, Clone)]
pub struct NewDuel {
    pub shortcode: String,
    pub round_limit: RoundLimit,
    pub wizards: Vec<WizardId>,
    pub players: Vec<PlayerId>,
    pub is_campaign: bool,
    pub created_by: Option<UserId>,
}

/// Typed change set applied with the duel's optimistic version check.
#[derive(Debug, Clone, Default)]
pub struct DuelChanges {
    pub status: Option<DuelStatus>,
    pub current_round: Option<u32>,
    pub roster: Option<(Vec<WizardId>, Vec<PlayerId>)>,
    pub scores: Option<(Points, HitPoints)>,
    pub pending_actors: Option<BTreeSet<WizardId>>,
    pub result: Option<(Vec<WizardId>, Vec<WizardId>)>,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

impl DuelChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: DuelStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn current_round(mut self, round: u32) -> Self {
        self.current_round = Some(round);
        self
    }

    pub fn roster(mut self, wizards: Vec<WizardId>, players: Vec<PlayerId>) -> Self {
        self.roster = Some((wizards, players));
        self
    }

    pub fn scores(mut self, points: Points, hit_points: HitPoints) -> Self {
        self.scores = Some((points, hit_points));
        self
    }

    pub fn pending_actors(mut self, pending: BTreeSet<WizardId>) -> Self {
        self.pending_actors = Some(pending);
        self
    }

    pub fn result(mut self, winners: Vec<WizardId>, losers: Vec<WizardId>) -> Self {
        self.result = Some((winners, losers));
        self
    }

    pub fn started_at(mut self, at: OffsetDateTime) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn ended_at(mut self, at: OffsetDateTime) -> Self {
        self.ended_at = Some(at);
        self
    }

    fn into_update(self, id: i64, expected_version: i32) -> Result<DuelUpdate, DomainError> {
        let mut update = DuelUpdate::new(id, expected_version);
        if let Some(status) = self.status {
            update = update.with_status(status);
        }
        if let Some(round) = self.current_round {
            update = update.with_current_round(i32::try_from(round).unwrap_or(i32::MAX));
        }
        if let Some((wizards, players)) = self.roster {
            update = update.with_roster(encode(&wizards)?, encode(&players)?);
        }
        if let Some((points, hit_points)) = self.scores {
            update = update.with_scores(encode(&points)?, encode(&hit_points)?);
        }
        if let Some(pending) = self.pending_actors {
            update = update.with_pending_actors(encode(&pending)?);
        }
        if let Some((winners, losers)) = self.result {
            update = update.with_result(encode(&winners)?, encode(&losers)?);
        }
        if let Some(at) = self.started_at {
            update = update.with_started_at(at);
        }
        if let Some(at) = self.ended_at {
            update = update.with_ended_at(at);
        }
        Ok(update)
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Option<Duel>, DomainError> {
    duels_adapter::find_by_id(conn, duel_id)
        .await?
        .map(Duel::try_from)
        .transpose()
}

/// Load a duel that must exist.
pub async fn require_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
) -> Result<Duel, DomainError> {
    find_by_id(conn, duel_id)
        .await?
        .ok_or_else(|| DomainError::duel_not_found(duel_id))
}

pub async fn find_by_shortcode<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    shortcode: &str,
) -> Result<Option<Duel>, DomainError> {
    duels_adapter::find_by_shortcode(conn, shortcode)
        .await?
        .map(Duel::try_from)
        .transpose()
}

pub async fn shortcode_exists<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    shortcode: &str,
) -> Result<bool, DomainError> {
    Ok(duels_adapter::shortcode_exists(conn, shortcode).await?)
}

pub async fn create_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    new: NewDuel,
) -> Result<Duel, DomainError> {
    let pending: BTreeSet<WizardId> = new.wizards.iter().cloned().collect();
    let dto = DuelCreate {
        shortcode: new.shortcode,
        max_rounds: new.round_limit.to_max_rounds(),
        points: encode(&Points::starting(&new.wizards))?,
        hit_points: encode(&HitPoints::starting(&new.wizards))?,
        pending_actors: encode(&pending)?,
        wizards: encode(&new.wizards)?,
        players: encode(&new.players)?,
        is_campaign: new.is_campaign,
        created_by: new.created_by.map(|u| u.0),
    };
    Duel::try_from(duels_adapter::create_duel(conn, dto).await?)
}

/// Apply `changes` if `duel.version` is still current; returns the refreshed duel.
pub async fn update_duel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel: &Duel,
    changes: DuelChanges,
) -> Result<Duel, DomainError> {
    let update = changes.into_update(duel.id, duel.version)?;
    Duel::try_from(duels_adapter::update_duel(conn, update).await?)
}

pub async fn set_featured_illustration<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    duel_id: i64,
    image_ref: &ImageRef,
) -> Result<(), DomainError> {
    match duels_adapter::set_featured_illustration(conn, duel_id, image_ref.as_str()).await? {
        0 => Err(DomainError::duel_not_found(duel_id)),
        _ => Ok(()),
    }
}
