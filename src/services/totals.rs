//! Total aggregation. A team's `total_score` is always re-derived from its score
//! rows and written back; it is never adjusted by a delta.

use tracing::debug;
use uuid::Uuid;

use crate::{dao::score_store::ScoreboardStore, error::ServiceError};

/// Sum every score row of `team_id`, store the result on the team and return it.
///
/// Idempotent: re-running it after a partial failure converges to the same total.
pub async fn recompute_total(
    store: &dyn ScoreboardStore,
    team_id: Uuid,
) -> Result<i64, ServiceError> {
    let scores = store.list_scores_for_team(team_id).await?;
    let total: i64 = scores.iter().map(|score| score.score_value).sum();

    if !store.set_team_total(team_id, total).await? {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }

    debug!(%team_id, rows = scores.len(), total, "recomputed team total");
    Ok(total)
}

/// Recompute the total of every existing team.
pub async fn recompute_all(store: &dyn ScoreboardStore) -> Result<(), ServiceError> {
    for team in store.list_teams().await? {
        recompute_total(store, team.id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{models::TeamEntity, score_store::memory::MemoryStore};

    #[tokio::test]
    async fn total_is_the_sum_of_all_rounds() {
        let store = MemoryStore::new();
        let team = TeamEntity::new("Red Romans");
        store.insert_team(team.clone()).await.unwrap();
        for value in [10, 5, -3] {
            store
                .upsert_score(team.id, Uuid::new_v4(), value)
                .await
                .unwrap();
        }

        assert_eq!(recompute_total(&store, team.id).await.unwrap(), 12);
        let stored = store.find_team(team.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 12);
    }

    #[tokio::test]
    async fn recompute_overwrites_a_drifted_total() {
        let store = MemoryStore::new();
        let team = TeamEntity::new("Blue Victorians");
        store.insert_team(team.clone()).await.unwrap();
        store.set_team_total(team.id, 999).await.unwrap();

        recompute_all(&store).await.unwrap();
        let stored = store.find_team(team.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 0);
    }

    #[tokio::test]
    async fn unknown_team_is_not_found() {
        let store = MemoryStore::new();
        let err = recompute_total(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
