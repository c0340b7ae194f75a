use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{RoundEntity, ScoreEntity, TeamEntity};

pub const TEAM_PREFIX: &str = "team::";
pub const TEAM_NAME_PREFIX: &str = "team-name::";
pub const ROUND_PREFIX: &str = "round::";
pub const ROUND_NAME_PREFIX: &str = "round-name::";
pub const SCORE_PREFIX: &str = "score::";
/// Counter document handing out round insertion numbers.
pub const ROUND_COUNTER_ID: &str = "counter::rounds";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Body of a `PUT` answer; only the new revision is kept.
#[derive(Debug, Deserialize)]
pub struct PutResponse {
    pub rev: String,
}

/// Minimal view of any document, enough to delete it.
#[derive(Debug, Deserialize)]
pub struct RevisionedDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchTeamDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub team: TeamEntity,
}

impl From<TeamEntity> for CouchTeamDocument {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team_doc_id(team.id),
            rev: None,
            team,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoundDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Insertion order drawn from [`ROUND_COUNTER_ID`].
    #[serde(default)]
    pub sequence: u64,
    #[serde(flatten)]
    pub round: RoundEntity,
}

impl From<RoundEntity> for CouchRoundDocument {
    fn from(round: RoundEntity) -> Self {
        Self {
            id: round_doc_id(round.id),
            rev: None,
            sequence: 0,
            round,
        }
    }
}

/// Monotonic counter updated under CouchDB revision control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchCounter {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub score: ScoreEntity,
}

impl From<ScoreEntity> for CouchScoreDocument {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: score_doc_id(score.team_id, score.round_id),
            rev: None,
            score,
        }
    }
}

/// Document whose existence reserves a unique name for its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchNameClaim {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub owner: Uuid,
    pub claimed_at: SystemTime,
}

impl CouchNameClaim {
    pub fn new(id: String, owner: Uuid) -> Self {
        Self {
            id,
            rev: None,
            owner,
            claimed_at: SystemTime::now(),
        }
    }
}

pub fn team_doc_id(id: Uuid) -> String {
    format!("{TEAM_PREFIX}{id}")
}

pub fn round_doc_id(id: Uuid) -> String {
    format!("{ROUND_PREFIX}{id}")
}

/// Deterministic id: one document per (team, round) is the uniqueness constraint.
pub fn score_doc_id(team_id: Uuid, round_id: Uuid) -> String {
    format!("{}{round_id}", team_score_prefix(team_id))
}

pub fn team_score_prefix(team_id: Uuid) -> String {
    format!("{SCORE_PREFIX}{team_id}::")
}

pub fn team_name_doc_id(name: &str) -> String {
    format!("{TEAM_NAME_PREFIX}{}", hex_name(name))
}

pub fn round_name_doc_id(name: &str) -> String {
    format!("{ROUND_NAME_PREFIX}{}", hex_name(name))
}

/// Names may hold `/`, spaces or unicode; hex keeps them path-safe and exact.
fn hex_name(name: &str) -> String {
    name.bytes().map(|byte| format!("{byte:02x}")).collect()
}
