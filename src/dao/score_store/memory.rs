//! Process-local store backed by concurrent maps.
//!
//! Name uniqueness goes through a name index claimed with the map entry API, and
//! score upserts use the entry of the `(team, round)` key, so both constraints
//! hold under concurrent writers the same way a database index would.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{RoundEntity, ScoreEntity, TeamEntity},
    score_store::ScoreboardStore,
    storage::{StorageError, StorageResult},
};

/// In-memory [`ScoreboardStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    teams: DashMap<Uuid, TeamEntity>,
    team_names: DashMap<String, Uuid>,
    rounds: DashMap<Uuid, SequencedRound>,
    round_names: DashMap<String, Uuid>,
    scores: DashMap<(Uuid, Uuid), ScoreEntity>,
    sequence: AtomicU64,
}

/// A round tagged with its insertion order.
#[derive(Clone)]
struct SequencedRound {
    sequence: u64,
    round: RoundEntity,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn insert_team(&self, team: TeamEntity) -> StorageResult<()> {
        match self.team_names.entry(team.name.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate("team", team.name)),
            Entry::Vacant(slot) => {
                slot.insert(team.id);
                self.teams.insert(team.id, team);
                Ok(())
            }
        }
    }

    fn delete_all_teams(&self) -> u64 {
        let ids: Vec<Uuid> = self.teams.iter().map(|entry| *entry.key()).collect();
        let mut removed = 0;
        for id in ids {
            if let Some((_, team)) = self.teams.remove(&id) {
                self.team_names.remove(&team.name);
                removed += 1;
            }
        }
        removed
    }

    fn update_team(&self, id: Uuid, update: impl FnOnce(&mut TeamEntity)) -> bool {
        match self.teams.get_mut(&id) {
            Some(mut team) => {
                update(&mut team);
                team.updated_at = SystemTime::now();
                true
            }
            None => false,
        }
    }

    fn insert_round(&self, round: RoundEntity) -> StorageResult<()> {
        match self.round_names.entry(round.name.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate("round", round.name)),
            Entry::Vacant(slot) => {
                slot.insert(round.id);
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
                self.rounds
                    .insert(round.id, SequencedRound { sequence, round });
                Ok(())
            }
        }
    }

    fn list_rounds(&self) -> Vec<RoundEntity> {
        let mut rounds: Vec<SequencedRound> =
            self.rounds.iter().map(|entry| entry.value().clone()).collect();
        rounds.sort_by_key(|entry| entry.sequence);
        rounds.into_iter().map(|entry| entry.round).collect()
    }

    fn delete_round(&self, id: Uuid) -> bool {
        match self.rounds.remove(&id) {
            Some((_, entry)) => {
                self.round_names.remove(&entry.round.name);
                true
            }
            None => false,
        }
    }

    fn upsert_score(&self, team_id: Uuid, round_id: Uuid, score_value: i64) -> ScoreEntity {
        let entry = self
            .scores
            .entry((team_id, round_id))
            .and_modify(|score| {
                score.score_value = score_value;
                score.updated_at = SystemTime::now();
            })
            .or_insert_with(|| ScoreEntity::new(team_id, round_id, score_value));
        entry.value().clone()
    }

    fn collect_scores(&self, filter: impl Fn(&ScoreEntity) -> bool) -> Vec<ScoreEntity> {
        let mut scores: Vec<ScoreEntity> = self
            .scores
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|score| filter(score))
            .collect();
        scores.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        scores
    }

    fn delete_scores(&self, filter: impl Fn(&ScoreEntity) -> bool) -> u64 {
        let before = self.scores.len();
        self.scores.retain(|_, score| !filter(score));
        (before - self.scores.len()) as u64
    }
}

impl ScoreboardStore for MemoryStore {
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut teams: Vec<TeamEntity> =
                inner.teams.iter().map(|entry| entry.value().clone()).collect();
            teams.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(teams)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.teams.get(&id).map(|team| team.clone())) })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.insert_team(team) })
    }

    fn delete_all_teams(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.delete_all_teams()) })
    }

    fn set_team_total(&self, id: Uuid, total: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.update_team(id, |team| team.total_score = total)) })
    }

    fn set_team_winner(
        &self,
        id: Uuid,
        is_winner: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.update_team(id, |team| team.is_winner = is_winner)) })
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.list_rounds()) })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.rounds.get(&id).map(|entry| entry.round.clone())) })
    }

    fn insert_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.insert_round(round) })
    }

    fn set_round_revealed(
        &self,
        id: Uuid,
        is_revealed: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(match inner.rounds.get_mut(&id) {
                Some(mut entry) => {
                    entry.round.is_revealed = is_revealed;
                    entry.round.updated_at = SystemTime::now();
                    true
                }
                None => false,
            })
        })
    }

    fn delete_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.delete_round(id)) })
    }

    fn upsert_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
        score_value: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.upsert_score(team_id, round_id, score_value)) })
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.collect_scores(|_| true)) })
    }

    fn list_scores_for_round(
        &self,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.collect_scores(|score| score.round_id == round_id)) })
    }

    fn list_scores_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.collect_scores(|score| score.team_id == team_id)) })
    }

    fn delete_scores_for_round(&self, round_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.delete_scores(|score| score.round_id == round_id)) })
    }

    fn delete_all_scores(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.delete_scores(|_| true)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn duplicate_team_name_is_rejected() {
        let store = MemoryStore::new();
        store.insert_team(TeamEntity::new("Red Romans")).await.unwrap();

        let err = store
            .insert_team(TeamEntity::new("Red Romans"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { entity: "team", .. }));
        assert_eq!(store.list_teams().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_teams_frees_their_names() {
        let store = MemoryStore::new();
        store.insert_team(TeamEntity::new("A")).await.unwrap();
        store.insert_team(TeamEntity::new("B")).await.unwrap();

        assert_eq!(store.delete_all_teams().await.unwrap(), 2);
        store.insert_team(TeamEntity::new("A")).await.unwrap();
        assert_eq!(store.list_teams().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let (team, round) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.upsert_score(team, round, 10).await.unwrap();
        let second = store.upsert_score(team, round, 25).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.score_value, 25);
        assert_eq!(store.list_scores().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rounds_are_listed_in_creation_order() {
        let store = MemoryStore::new();
        for name in ["R1", "R2", "R3"] {
            store.insert_round(RoundEntity::new(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_rounds()
            .await
            .unwrap()
            .into_iter()
            .map(|round| round.name)
            .collect();
        assert_eq!(names, ["R1", "R2", "R3"]);
    }

    #[tokio::test]
    async fn round_order_ignores_clock_steps() {
        let store = MemoryStore::new();
        let first = RoundEntity::new("R1");
        let mut second = RoundEntity::new("R2");
        second.created_at = first.created_at - Duration::from_secs(3_600);
        store.insert_round(first).await.unwrap();
        store.insert_round(second).await.unwrap();

        let names: Vec<String> = store
            .list_rounds()
            .await
            .unwrap()
            .into_iter()
            .map(|round| round.name)
            .collect();
        assert_eq!(names, ["R1", "R2"]);
    }

    #[tokio::test]
    async fn deleting_round_scores_only_touches_that_round() {
        let store = MemoryStore::new();
        let team = Uuid::new_v4();
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        store.upsert_score(team, r1, 1).await.unwrap();
        store.upsert_score(team, r2, 2).await.unwrap();

        assert_eq!(store.delete_scores_for_round(r1).await.unwrap(), 1);
        let remaining = store.list_scores_for_team(team).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].round_id, r2);
    }
}
