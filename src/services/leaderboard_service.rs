//! Read-only projections for the public display.

use std::collections::HashMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dto::{common::TeamResponse, leaderboard::HistoryPoint},
    error::ServiceError,
    state::SharedState,
};

/// Teams sorted by total descending. Equal totals keep name order.
pub async fn get_leaderboard(state: &SharedState) -> Result<Vec<TeamResponse>, ServiceError> {
    let store = state.require_store().await?;
    let mut teams = store.list_teams().await?;
    teams.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    Ok(teams.into_iter().map(TeamResponse::from).collect())
}

/// One point per round, oldest first, holding every team's score for that round.
///
/// Hidden rounds are still listed with their values; `isRevealed` lets the
/// display decide what to draw.
pub async fn get_history(state: &SharedState) -> Result<Vec<HistoryPoint>, ServiceError> {
    let store = state.require_store().await?;
    let teams = store.list_teams().await?;
    let rounds = store.list_rounds().await?;

    let mut by_key: HashMap<(Uuid, Uuid), i64> = HashMap::new();
    for score in store.list_scores().await? {
        by_key.insert((score.team_id, score.round_id), score.score_value);
    }

    let history = rounds
        .into_iter()
        .map(|round| {
            let scores: IndexMap<String, i64> = teams
                .iter()
                .map(|team| {
                    let value = by_key.get(&(team.id, round.id)).copied().unwrap_or(0);
                    (team.name.clone(), value)
                })
                .collect();
            HistoryPoint {
                time: round.name,
                is_revealed: round.is_revealed,
                scores,
            }
        })
        .collect();

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::admin::UpsertScoreRequest,
        services::score_service::{
            self,
            tests::{memory_state, seed_round, seed_team},
        },
    };

    async fn score(state: &SharedState, team_id: Uuid, round_id: Uuid, score_value: i64) {
        score_service::upsert_score(
            state,
            UpsertScoreRequest {
                team_id,
                round_id,
                score_value,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn single_round_scenario() {
        let state = memory_state().await;
        let a = seed_team(&state, "A").await;
        let b = seed_team(&state, "B").await;
        let c = seed_team(&state, "C").await;
        let d = seed_team(&state, "D").await;
        let r1 = seed_round(&state, "R1").await;
        score(&state, a, r1, 10).await;
        score(&state, b, r1, 20).await;
        score(&state, c, r1, 0).await;
        score(&state, d, r1, 0).await;

        let board = get_leaderboard(&state).await.unwrap();
        let order: Vec<_> = board.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(order, ["B", "A", "C", "D"]);
        assert_eq!(board[0].total_score, 20);

        let history = get_history(&state).await.unwrap();
        assert_eq!(history.len(), 1);
        let json = serde_json::to_value(&history[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"time": "R1", "isRevealed": false, "A": 10, "B": 20, "C": 0, "D": 0})
        );
    }

    #[tokio::test]
    async fn history_is_per_round_with_zero_defaults() {
        let state = memory_state().await;
        let a = seed_team(&state, "A").await;
        seed_team(&state, "B").await;
        let r1 = seed_round(&state, "R1").await;
        let r2 = seed_round(&state, "R2").await;
        score(&state, a, r1, 10).await;
        score(&state, a, r2, 5).await;

        let history = get_history(&state).await.unwrap();
        let times: Vec<_> = history.iter().map(|point| point.time.as_str()).collect();
        assert_eq!(times, ["R1", "R2"]);
        assert_eq!(history[1].scores["A"], 5);
        assert_eq!(history[1].scores["B"], 0);
    }

    #[tokio::test]
    async fn ties_keep_name_order() {
        let state = memory_state().await;
        for name in ["Delta", "Alpha", "Charlie"] {
            seed_team(&state, name).await;
        }

        let board = get_leaderboard(&state).await.unwrap();
        let order: Vec<_> = board.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(order, ["Alpha", "Charlie", "Delta"]);
    }
}
