use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One of the competing teams. `total_score` is owned by the totals aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Sum of every score row referencing this team.
    pub total_score: i64,
    /// Manually flagged winner; drives the celebration state of the leaderboard.
    pub is_winner: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time this team was updated.
    pub updated_at: SystemTime,
}

impl TeamEntity {
    /// Build a fresh team with a zero total.
    pub fn new(name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            total_score: 0,
            is_winner: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A tournament round. Rounds are sequenced by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Stable identifier for the round.
    pub id: Uuid,
    /// Unique display name (e.g. "R1").
    pub name: String,
    /// Whether the public display may reveal this round's scores.
    pub is_revealed: bool,
    /// Creation timestamp, defines the round order.
    pub created_at: SystemTime,
    /// Last time this round was updated.
    pub updated_at: SystemTime,
}

impl RoundEntity {
    /// Build a fresh, unrevealed round.
    pub fn new(name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_revealed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Score of one team for one round. At most one row exists per (team, round).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Stable identifier for the score row.
    pub id: Uuid,
    /// Team this score belongs to.
    pub team_id: Uuid,
    /// Round this score belongs to.
    pub round_id: Uuid,
    /// Points scored in the round. Any integer is accepted.
    pub score_value: i64,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the value was overwritten.
    pub updated_at: SystemTime,
}

impl ScoreEntity {
    /// Build a fresh score row for the given key.
    pub fn new(team_id: Uuid, round_id: Uuid, score_value: i64) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            team_id,
            round_id,
            score_value,
            created_at: now,
            updated_at: now,
        }
    }
}
