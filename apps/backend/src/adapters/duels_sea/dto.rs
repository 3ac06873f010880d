//! DTOs for duels_sea adapter.

use sea_orm::prelude::Json;
use time::OffsetDateTime;

use crate::entities::duels::DuelStatus;

/// DTO for inserting a new duel row. Maps are already encoded as JSON.
#[derive(Debug, Clone)]
pub struct DuelCreate {
    pub shortcode: String,
    pub max_rounds: Option<i32>,
    pub wizards: Json,
    pub players: Json,
    pub points: Json,
    pub hit_points: Json,
    pub pending_actors: Json,
    pub is_campaign: bool,
    pub created_by: Option<String>,
}

/// Optimistic update of any combination of duel columns.
///
/// `None` leaves a column untouched; every applied update bumps `version` once.
#[derive(Debug, Clone)]
pub struct DuelUpdate {
    pub id: i64,
    pub expected_version: i32,
    pub status: Option<DuelStatus>,
    pub current_round: Option<i32>,
    pub wizards: Option<Json>,
    pub players: Option<Json>,
    pub points: Option<Json>,
    pub hit_points: Option<Json>,
    pub pending_actors: Option<Json>,
    pub winners: Option<Json>,
    pub losers: Option<Json>,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

impl DuelUpdate {
    pub fn new(id: i64, expected_version: i32) -> Self {
        Self {
            id,
            expected_version,
            status: None,
            current_round: None,
            wizards: None,
            players: None,
            points: None,
            hit_points: None,
            pending_actors: None,
            winners: None,
            losers: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn with_status(mut self, status: DuelStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_current_round(mut self, round: i32) -> Self {
        self.current_round = Some(round);
        self
    }

    pub fn with_roster(mut self, wizards: Json, players: Json) -> Self {
        self.wizards = Some(wizards);
        self.players = Some(players);
        self
    }

    pub fn with_scores(mut self, points: Json, hit_points: Json) -> Self {
        self.points = Some(points);
        self.hit_points = Some(hit_points);
        self
    }

    pub fn with_pending_actors(mut self, pending: Json) -> Self {
        self.pending_actors = Some(pending);
        self
    }

    pub fn with_result(mut self, winners: Json, losers: Json) -> Self {
        self.winners = Some(winners);
        self.losers = Some(losers);
        self
    }

    pub fn with_started_at(mut self, at: OffsetDateTime) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn with_ended_at(mut self, at: OffsetDateTime) -> Self {
        self.ended_at = Some(at);
        self
    }
}
