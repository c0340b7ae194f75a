/// CouchDB backend over its HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// Process-local backend used by tests and `STORAGE_BACKEND=memory`.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{RoundEntity, ScoreEntity, TeamEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for teams, rounds and scores.
///
/// Uniqueness of team names, round names and (team, round) score keys is the
/// store's job: implementations report violations as
/// [`StorageError::Duplicate`](crate::dao::storage::StorageError::Duplicate)
/// instead of relying on callers checking first.
pub trait ScoreboardStore: Send + Sync {
    /// Every team, ordered by name.
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Look up a team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Insert a new team. A taken name fails with `Duplicate`.
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove every team, returning how many were dropped.
    fn delete_all_teams(&self) -> BoxFuture<'static, StorageResult<u64>>;
    /// Overwrite the stored total. Returns `false` when the team does not exist.
    fn set_team_total(&self, id: Uuid, total: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Set the winner flag. Returns `false` when the team does not exist.
    fn set_team_winner(&self, id: Uuid, is_winner: bool)
    -> BoxFuture<'static, StorageResult<bool>>;

    /// Every round, oldest first.
    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>>;
    /// Look up a round by id.
    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    /// Insert a new round at the end of the sequence. A taken name fails with `Duplicate`.
    fn insert_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Set the reveal flag. Returns `false` when the round does not exist.
    fn set_round_revealed(
        &self,
        id: Uuid,
        is_revealed: bool,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a round row. Returns `false` when it was already gone.
    fn delete_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Create or overwrite the score keyed by (team, round) and return the stored row.
    fn upsert_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
        score_value: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>>;
    /// Every score row.
    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Score rows of one round.
    fn list_scores_for_round(
        &self,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Score rows of one team, across all rounds.
    fn list_scores_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Remove the score rows of one round, returning how many were dropped.
    fn delete_scores_for_round(&self, round_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;
    /// Remove every score row, returning how many were dropped.
    fn delete_all_scores(&self) -> BoxFuture<'static, StorageResult<u64>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
