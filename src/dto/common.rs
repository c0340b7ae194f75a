//! Record shapes shared by the admin and public APIs.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{RoundEntity, ScoreEntity, TeamEntity},
    dto::format_system_time,
};

/// A team as exposed to REST clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Sum of the team's round scores.
    pub total_score: i64,
    /// When any team is flagged, the public display switches to its celebration state.
    pub is_winner: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last change.
    pub updated_at: String,
}

impl From<TeamEntity> for TeamResponse {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            total_score: team.total_score,
            is_winner: team.is_winner,
            created_at: format_system_time(team.created_at),
            updated_at: format_system_time(team.updated_at),
        }
    }
}

/// A round as exposed to REST clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Whether the display may show this round's scores.
    pub is_revealed: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last change.
    pub updated_at: String,
}

impl From<RoundEntity> for RoundResponse {
    fn from(round: RoundEntity) -> Self {
        Self {
            id: round.id,
            name: round.name,
            is_revealed: round.is_revealed,
            created_at: format_system_time(round.created_at),
            updated_at: format_system_time(round.updated_at),
        }
    }
}

/// A stored score row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    /// Stable identifier.
    pub id: Uuid,
    /// Team the score belongs to.
    pub team_id: Uuid,
    /// Round the score belongs to.
    pub round_id: Uuid,
    /// Points for this round; may be negative.
    pub score_value: i64,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last change.
    pub updated_at: String,
}

impl From<ScoreEntity> for ScoreResponse {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: score.id,
            team_id: score.team_id,
            round_id: score.round_id,
            score_value: score.score_value,
            created_at: format_system_time(score.created_at),
            updated_at: format_system_time(score.updated_at),
        }
    }
}
