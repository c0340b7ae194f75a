//! Score ledger: one score row per (team, round), every write followed by a
//! recompute of the affected team's total.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{RoundScoreEntry, ScoreUpdateResponse, TeamRef, UpsertScoreRequest},
        common::ScoreResponse,
    },
    error::ServiceError,
    services::totals,
    state::SharedState,
};

/// Create or overwrite the score of a team for a round and refresh the team total.
pub async fn upsert_score(
    state: &SharedState,
    request: UpsertScoreRequest,
) -> Result<ScoreUpdateResponse, ServiceError> {
    let store = state.require_store().await?;
    let UpsertScoreRequest {
        team_id,
        round_id,
        score_value,
    } = request;

    if store.find_team(team_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }
    if store.find_round(round_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "round `{round_id}` not found"
        )));
    }

    let score = store.upsert_score(team_id, round_id, score_value).await?;
    let new_total_score = totals::recompute_total(store.as_ref(), team_id).await?;

    info!(%team_id, %round_id, score_value, new_total_score, "score updated");
    Ok(ScoreUpdateResponse {
        message: "Score updated successfully".into(),
        score: ScoreResponse::from(score),
        new_total_score,
    })
}

/// Scores of a round, each resolved to its team.
pub async fn list_scores_for_round(
    state: &SharedState,
    round_id: Uuid,
) -> Result<Vec<RoundScoreEntry>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_round(round_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "round `{round_id}` not found"
        )));
    }

    let names: HashMap<Uuid, String> = store
        .list_teams()
        .await?
        .into_iter()
        .map(|team| (team.id, team.name))
        .collect();

    let entries = store
        .list_scores_for_round(round_id)
        .await?
        .into_iter()
        .map(|score| RoundScoreEntry {
            id: score.id,
            team: names.get(&score.team_id).map(|name| TeamRef {
                id: score.team_id,
                name: name.clone(),
            }),
            team_id: score.team_id,
            round_id: score.round_id,
            score_value: score.score_value,
        })
        .collect();

    Ok(entries)
}

/// Drop every score row of a round. Totals are left to the caller.
pub async fn delete_scores_for_round(
    state: &SharedState,
    round_id: Uuid,
) -> Result<u64, ServiceError> {
    let store = state.require_store().await?;
    let deleted = store.delete_scores_for_round(round_id).await?;
    debug!(%round_id, deleted, "deleted round scores");
    Ok(deleted)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{RoundEntity, TeamEntity},
            score_store::memory::MemoryStore,
        },
        state::AppState,
    };

    pub(crate) async fn memory_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    pub(crate) async fn seed_team(state: &SharedState, name: &str) -> Uuid {
        let team = TeamEntity::new(name.to_string());
        let id = team.id;
        state
            .require_store()
            .await
            .unwrap()
            .insert_team(team)
            .await
            .unwrap();
        id
    }

    pub(crate) async fn seed_round(state: &SharedState, name: &str) -> Uuid {
        let round = RoundEntity::new(name.to_string());
        let id = round.id;
        state
            .require_store()
            .await
            .unwrap()
            .insert_round(round)
            .await
            .unwrap();
        id
    }

    fn request(team_id: Uuid, round_id: Uuid, score_value: i64) -> UpsertScoreRequest {
        UpsertScoreRequest {
            team_id,
            round_id,
            score_value,
        }
    }

    #[tokio::test]
    async fn repeated_upsert_overwrites_instead_of_adding() {
        let state = memory_state().await;
        let team = seed_team(&state, "A").await;
        let round = seed_round(&state, "R1").await;

        upsert_score(&state, request(team, round, 7)).await.unwrap();
        let response = upsert_score(&state, request(team, round, 7)).await.unwrap();

        assert_eq!(response.new_total_score, 7);
        assert_eq!(response.message, "Score updated successfully");
        let rows = list_scores_for_round(&state, round).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn totals_sum_across_rounds() {
        let state = memory_state().await;
        let team = seed_team(&state, "A").await;
        let r1 = seed_round(&state, "R1").await;
        let r2 = seed_round(&state, "R2").await;

        upsert_score(&state, request(team, r1, 10)).await.unwrap();
        let response = upsert_score(&state, request(team, r2, 5)).await.unwrap();
        assert_eq!(response.new_total_score, 15);

        let response = upsert_score(&state, request(team, r2, 2)).await.unwrap();
        assert_eq!(response.new_total_score, 12);
    }

    #[tokio::test]
    async fn unknown_team_or_round_is_not_found() {
        let state = memory_state().await;
        let team = seed_team(&state, "A").await;
        let round = seed_round(&state, "R1").await;

        assert!(matches!(
            upsert_score(&state, request(Uuid::new_v4(), round, 1)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            upsert_score(&state, request(team, Uuid::new_v4(), 1)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            list_scores_for_round(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn round_scores_resolve_team_names() {
        let state = memory_state().await;
        let team = seed_team(&state, "Red Romans").await;
        let round = seed_round(&state, "R1").await;
        upsert_score(&state, request(team, round, 3)).await.unwrap();

        let rows = list_scores_for_round(&state, round).await.unwrap();
        let resolved = rows[0].team.as_ref().unwrap();
        assert_eq!(resolved.name, "Red Romans");
        assert_eq!(resolved.id, team);
    }

    #[tokio::test]
    async fn degraded_state_rejects_writes() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            upsert_score(&state, request(Uuid::new_v4(), Uuid::new_v4(), 1)).await,
            Err(ServiceError::Degraded)
        ));
    }
}
