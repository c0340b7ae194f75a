//! Team registry. The tournament always runs with exactly the configured
//! number of teams; any other count is repaired by resetting to the defaults.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::TEAM_COUNT,
    dao::{models::TeamEntity, score_store::ScoreboardStore, storage::StorageError},
    dto::{
        admin::{NameRequest, ResetTeamsResponse},
        common::TeamResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// List teams ordered by name, resetting the registry first when the count is off.
pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamResponse>, ServiceError> {
    let store = state.require_store().await?;
    let teams = store.list_teams().await?;
    if teams.len() == TEAM_COUNT {
        return Ok(teams.into_iter().map(TeamResponse::from).collect());
    }

    warn!(
        found = teams.len(),
        expected = TEAM_COUNT,
        "team registry is inconsistent; resetting to default teams"
    );
    let reset = reset_to_default_teams(state).await?;
    Ok(reset.teams)
}

/// Discard every team and score, then recreate the configured default teams.
///
/// Scores are dropped too: they reference team ids that no longer exist.
/// Resets are not serialized against each other. When two run at once, a
/// default name that already exists was recreated by the other reset and is
/// kept as is.
pub async fn reset_to_default_teams(
    state: &SharedState,
) -> Result<ResetTeamsResponse, ServiceError> {
    let store = state.require_store().await?;
    let discarded_teams = store.delete_all_teams().await?;
    let discarded_scores = store.delete_all_scores().await?;

    insert_default_teams(store.as_ref(), state.config().default_teams()).await?;

    let teams = store.list_teams().await?;
    warn!(
        discarded_teams,
        discarded_scores,
        created = teams.len(),
        "team registry reset to defaults"
    );

    Ok(ResetTeamsResponse {
        discarded_teams,
        discarded_scores,
        teams: teams.into_iter().map(TeamResponse::from).collect(),
    })
}

async fn insert_default_teams(
    store: &dyn ScoreboardStore,
    names: &[String],
) -> Result<(), ServiceError> {
    for name in names {
        match store.insert_team(TeamEntity::new(name.as_str())).await {
            Ok(()) => {}
            Err(StorageError::Duplicate { value, .. }) => {
                debug!(name = %value, "default team already recreated by a concurrent reset");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Create a team with a zero total. Duplicate names are rejected by the store.
///
/// A fifth team is accepted here but discarded by the next [`list_teams`].
pub async fn create_team(
    state: &SharedState,
    request: NameRequest,
) -> Result<TeamResponse, ServiceError> {
    let store = state.require_store().await?;
    let team = TeamEntity::new(request.name.trim());
    store.insert_team(team.clone()).await?;
    info!(team_id = %team.id, name = %team.name, "team created");
    Ok(team.into())
}

/// Flag or unflag a team as winner. Several teams may be flagged at once.
pub async fn set_winner(
    state: &SharedState,
    team_id: Uuid,
    is_winner: bool,
) -> Result<TeamResponse, ServiceError> {
    let store = state.require_store().await?;
    let not_found = || ServiceError::NotFound(format!("team `{team_id}` not found"));
    if !store.set_team_winner(team_id, is_winner).await? {
        return Err(not_found());
    }

    let team = store.find_team(team_id).await?.ok_or_else(not_found)?;
    info!(%team_id, is_winner, "winner flag updated");
    Ok(team.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DEFAULT_TEAMS,
        services::score_service::tests::{memory_state, seed_round, seed_team},
    };

    async fn seed_teams(state: &SharedState, count: usize) {
        for index in 0..count {
            seed_team(state, &format!("Custom {index}")).await;
        }
    }

    fn default_names() -> Vec<String> {
        let mut names: Vec<String> = DEFAULT_TEAMS.iter().map(|name| name.to_string()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn list_heals_any_wrong_team_count() {
        for count in [0, 1, 3, 5] {
            let state = memory_state().await;
            seed_teams(&state, count).await;

            let teams = list_teams(&state).await.unwrap();
            let names: Vec<String> = teams.iter().map(|team| team.name.clone()).collect();
            assert_eq!(names, default_names(), "starting from {count} teams");
            assert!(teams.iter().all(|team| team.total_score == 0));
        }
    }

    #[tokio::test]
    async fn list_keeps_a_consistent_registry() {
        let state = memory_state().await;
        seed_teams(&state, TEAM_COUNT).await;

        let teams = list_teams(&state).await.unwrap();
        assert!(teams.iter().all(|team| team.name.starts_with("Custom")));
    }

    #[tokio::test]
    async fn reset_discards_teams_and_scores() {
        let state = memory_state().await;
        let team = seed_team(&state, "Old").await;
        let round = seed_round(&state, "R1").await;
        let store = state.require_store().await.unwrap();
        store.upsert_score(team, round, 4).await.unwrap();

        let reset = reset_to_default_teams(&state).await.unwrap();
        assert_eq!(reset.discarded_teams, 1);
        assert_eq!(reset.discarded_scores, 1);
        assert_eq!(reset.teams.len(), TEAM_COUNT);
        assert!(store.list_scores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_reset_keeps_existing_default_team() {
        let state = memory_state().await;
        let existing = seed_team(&state, "Red Romans").await;
        let store = state.require_store().await.unwrap();

        insert_default_teams(store.as_ref(), state.config().default_teams())
            .await
            .unwrap();

        let teams = store.list_teams().await.unwrap();
        assert_eq!(teams.len(), TEAM_COUNT);
        let red = teams.iter().find(|team| team.name == "Red Romans").unwrap();
        assert_eq!(red.id, existing);
    }

    #[tokio::test]
    async fn create_team_rejects_duplicates() {
        let state = memory_state().await;
        let team = create_team(&state, NameRequest { name: " Blue ".into() })
            .await
            .unwrap();
        assert_eq!(team.name, "Blue");
        assert_eq!(team.total_score, 0);

        assert!(matches!(
            create_team(&state, NameRequest { name: "Blue".into() }).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn winner_flag_is_not_exclusive() {
        let state = memory_state().await;
        let a = seed_team(&state, "A").await;
        let b = seed_team(&state, "B").await;

        assert!(set_winner(&state, a, true).await.unwrap().is_winner);
        assert!(set_winner(&state, b, true).await.unwrap().is_winner);
        let store = state.require_store().await.unwrap();
        assert!(store.find_team(a).await.unwrap().unwrap().is_winner);

        assert!(matches!(
            set_winner(&state, Uuid::new_v4(), true).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
