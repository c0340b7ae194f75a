//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    common::{ScoreResponse, TeamResponse},
    validation::validate_display_name,
};

/// Payload creating a round or a team. Only a unique display name is needed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    /// Missing names deserialize as empty and are rejected by validation.
    #[serde(default)]
    pub name: String,
}

impl Validate for NameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Request to create or overwrite the score of a team for a round.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertScoreRequest {
    pub team_id: Uuid,
    pub round_id: Uuid,
    #[serde(default)]
    pub score_value: i64,
}

/// Request to show or hide a round on the public history.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevealRoundRequest {
    pub is_revealed: bool,
}

/// Request to flag or unflag a team as winner.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRequest {
    pub is_winner: bool,
}

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Result of a score upsert, returning the stored row and the recomputed total.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateResponse {
    pub message: String,
    pub score: ScoreResponse,
    pub new_total_score: i64,
}

/// Team identity resolved on a score entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamRef {
    pub id: Uuid,
    pub name: String,
}

/// Score of one team in the round being edited.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundScoreEntry {
    pub id: Uuid,
    /// `None` when the row references a team that no longer exists.
    pub team: Option<TeamRef>,
    pub team_id: Uuid,
    pub round_id: Uuid,
    pub score_value: i64,
}

/// Outcome of resetting the registry to the default roster.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetTeamsResponse {
    pub discarded_teams: u64,
    pub discarded_scores: u64,
    pub teams: Vec<TeamResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_fails_validation() {
        let request: NameRequest = serde_json::from_str("{}").unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn score_value_defaults_to_zero() {
        let body = format!(
            r#"{{"teamId": "{}", "roundId": "{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let request: UpsertScoreRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(request.score_value, 0);
    }
}
