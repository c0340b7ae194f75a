use mongodb::bson::{DateTime, Document, Uuid as BsonUuid, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{RoundEntity, ScoreEntity, TeamEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: BsonUuid,
    name: String,
    #[serde(default)]
    total_score: i64,
    #[serde(default)]
    is_winner: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: bson_uuid(value.id),
            name: value.name,
            total_score: value.total_score,
            is_winner: value.is_winner,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            name: value.name,
            total_score: value.total_score,
            is_winner: value.is_winner,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(rename = "_id")]
    id: BsonUuid,
    name: String,
    #[serde(default)]
    is_revealed: bool,
    /// Insertion order, drawn from the round counter.
    #[serde(default)]
    sequence: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl MongoRoundDocument {
    /// Stamp the insertion order drawn from the round counter.
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: bson_uuid(value.id),
            name: value.name,
            is_revealed: value.is_revealed,
            sequence: 0,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoRoundDocument> for RoundEntity {
    fn from(value: MongoRoundDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            name: value.name,
            is_revealed: value.is_revealed,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: BsonUuid,
    team_id: BsonUuid,
    round_id: BsonUuid,
    #[serde(default)]
    score_value: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            id: from_bson_uuid(value.id),
            team_id: from_bson_uuid(value.team_id),
            round_id: from_bson_uuid(value.round_id),
            score_value: value.score_value,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn bson_uuid(id: Uuid) -> BsonUuid {
    BsonUuid::from_bytes(id.into_bytes())
}

fn from_bson_uuid(id: BsonUuid) -> Uuid {
    Uuid::from_bytes(id.bytes())
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": bson_uuid(id)}
}

/// Filter matching the unique (team, round) key of a score.
pub fn score_key(team_id: Uuid, round_id: Uuid) -> Document {
    doc! {"team_id": bson_uuid(team_id), "round_id": bson_uuid(round_id)}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_document_round_trips_identity_and_flags() {
        let mut team = TeamEntity::new("Blue Victorians");
        team.total_score = 42;
        team.is_winner = true;

        let back: TeamEntity = MongoTeamDocument::from(team.clone()).into();
        assert_eq!(back.id, team.id);
        assert_eq!(back.name, team.name);
        assert_eq!(back.total_score, 42);
        assert!(back.is_winner);
    }

    #[test]
    fn round_document_carries_its_sequence() {
        let round = RoundEntity::new("R1");
        let document = MongoRoundDocument::from(round.clone()).with_sequence(7);
        assert_eq!(document.sequence, 7);

        let back: RoundEntity = document.into();
        assert_eq!(back.id, round.id);
        assert_eq!(back.name, "R1");
    }

    #[test]
    fn score_key_filters_on_both_ids() {
        let (team, round) = (Uuid::new_v4(), Uuid::new_v4());
        let filter = score_key(team, round);
        assert!(filter.contains_key("team_id"));
        assert!(filter.contains_key("round_id"));
        assert_eq!(filter.len(), 2);
    }
}
