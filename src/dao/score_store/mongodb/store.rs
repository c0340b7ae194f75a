use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoRoundDocument, MongoScoreDocument, MongoTeamDocument, bson_uuid, doc_id, score_key,
    },
};
use crate::dao::{
    models::{RoundEntity, ScoreEntity, TeamEntity},
    score_store::ScoreboardStore,
    storage::StorageResult,
};

const TEAM_COLLECTION_NAME: &str = "teams";
const ROUND_COLLECTION_NAME: &str = "rounds";
const SCORE_COLLECTION_NAME: &str = "scores";
const COUNTER_COLLECTION_NAME: &str = "counters";
const ROUND_SEQUENCE_KEY: &str = "rounds";
/// A concurrent upsert on the same key can lose the insert race once; the retry updates.
const UPSERT_ATTEMPTS: u32 = 2;

/// MongoDB-backed [`ScoreboardStore`] implementation.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = establish_connection(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure the unique indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = establish_connection(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let indexes: [(&'static str, &'static str, mongodb::bson::Document, bool); 5] = [
            (TEAM_COLLECTION_NAME, "name", doc! {"name": 1}, true),
            (ROUND_COLLECTION_NAME, "name", doc! {"name": 1}, true),
            (ROUND_COLLECTION_NAME, "sequence", doc! {"sequence": 1}, false),
            (
                SCORE_COLLECTION_NAME,
                "team_id,round_id",
                doc! {"team_id": 1, "round_id": 1},
                true,
            ),
            (SCORE_COLLECTION_NAME, "round_id", doc! {"round_id": 1}, false),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        self.database().await.collection(TEAM_COLLECTION_NAME)
    }

    async fn round_collection(&self) -> Collection<MongoRoundDocument> {
        self.database().await.collection(ROUND_COLLECTION_NAME)
    }

    async fn score_collection(&self) -> Collection<MongoScoreDocument> {
        self.database().await.collection(SCORE_COLLECTION_NAME)
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .team_collection()
            .await
            .find(doc! {})
            .sort(doc! {"name": 1})
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .team_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTeams { source })?;
        Ok(document.map(Into::into))
    }

    async fn insert_team(&self, team: TeamEntity) -> MongoResult<()> {
        let name = team.name.clone();
        let document: MongoTeamDocument = team.into();
        self.team_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::Duplicate {
                        entity: "team",
                        value: name.clone(),
                    }
                } else {
                    MongoDaoError::SaveTeam { name, source }
                }
            })?;
        Ok(())
    }

    async fn delete_all_teams(&self) -> MongoResult<u64> {
        let result = self
            .team_collection()
            .await
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::DeleteTeams { source })?;
        Ok(result.deleted_count)
    }

    async fn update_team(&self, id: Uuid, fields: mongodb::bson::Document) -> MongoResult<bool> {
        let mut fields = fields;
        fields.insert("updated_at", DateTime::now());
        let result = self
            .team_collection()
            .await
            .update_one(doc_id(id), doc! {"$set": fields})
            .await
            .map_err(|source| MongoDaoError::UpdateTeam { id, source })?;
        Ok(result.matched_count > 0)
    }

    async fn list_rounds(&self) -> MongoResult<Vec<RoundEntity>> {
        let documents: Vec<MongoRoundDocument> = self
            .round_collection()
            .await
            .find(doc! {})
            .sort(doc! {"sequence": 1})
            .await
            .map_err(|source| MongoDaoError::LoadRounds { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadRounds { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_round(&self, id: Uuid) -> MongoResult<Option<RoundEntity>> {
        let document = self
            .round_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadRounds { source })?;
        Ok(document.map(Into::into))
    }

    /// Atomically draw the next round sequence number from the counter document.
    async fn next_round_sequence(&self) -> MongoResult<i64> {
        let counter = self
            .database()
            .await
            .collection::<mongodb::bson::Document>(COUNTER_COLLECTION_NAME)
            .find_one_and_update(
                doc! {"_id": ROUND_SEQUENCE_KEY},
                doc! {"$inc": {"seq": 1_i64}},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextSequence { source })?
            .ok_or(MongoDaoError::MissingSequence)?;

        counter
            .get_i64("seq")
            .map_err(|_| MongoDaoError::MissingSequence)
    }

    async fn insert_round(&self, round: RoundEntity) -> MongoResult<()> {
        let name = round.name.clone();
        let sequence = self.next_round_sequence().await?;
        let document = MongoRoundDocument::from(round).with_sequence(sequence);
        self.round_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::Duplicate {
                        entity: "round",
                        value: name.clone(),
                    }
                } else {
                    MongoDaoError::SaveRound { name, source }
                }
            })?;
        Ok(())
    }

    async fn set_round_revealed(&self, id: Uuid, is_revealed: bool) -> MongoResult<bool> {
        let result = self
            .round_collection()
            .await
            .update_one(
                doc_id(id),
                doc! {"$set": {"is_revealed": is_revealed, "updated_at": DateTime::now()}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateRound { id, source })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_round(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .round_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteRound { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn upsert_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
        score_value: i64,
    ) -> MongoResult<ScoreEntity> {
        let collection = self.score_collection().await;
        let now = DateTime::now();
        let update = doc! {
            "$set": {"score_value": score_value, "updated_at": now},
            "$setOnInsert": {"_id": bson_uuid(Uuid::new_v4()), "created_at": now},
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = collection
                .find_one_and_update(score_key(team_id, round_id), update.clone())
                .upsert(true)
                .return_document(ReturnDocument::After)
                .await;

            match outcome {
                Ok(Some(document)) => return Ok(document.into()),
                Ok(None) => return Err(MongoDaoError::MissingUpsertResult { team_id, round_id }),
                Err(source) if is_duplicate_key(&source) && attempts < UPSERT_ATTEMPTS => {
                    debug!(%team_id, %round_id, "score upsert lost insert race; retrying as update");
                }
                Err(source) => {
                    return Err(MongoDaoError::UpsertScore {
                        team_id,
                        round_id,
                        source,
                    });
                }
            }
        }
    }

    async fn find_scores(&self, filter: mongodb::bson::Document) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .score_collection()
            .await
            .find(filter)
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::LoadScores { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadScores { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_scores(&self, filter: mongodb::bson::Document) -> MongoResult<u64> {
        let result = self
            .score_collection()
            .await
            .delete_many(filter)
            .await
            .map_err(|source| MongoDaoError::DeleteScores { source })?;
        Ok(result.deleted_count)
    }
}

impl ScoreboardStore for MongoScoreStore {
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_team(team).await.map_err(Into::into) })
    }

    fn delete_all_teams(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete_all_teams().await.map_err(Into::into) })
    }

    fn set_team_total(&self, id: Uuid, total: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_team(id, doc! {"total_score": total})
                .await
                .map_err(Into::into)
        })
    }

    fn set_team_winner(
        &self,
        id: Uuid,
        is_winner: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_team(id, doc! {"is_winner": is_winner})
                .await
                .map_err(Into::into)
        })
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_rounds().await.map_err(Into::into) })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_round(id).await.map_err(Into::into) })
    }

    fn insert_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_round(round).await.map_err(Into::into) })
    }

    fn set_round_revealed(
        &self,
        id: Uuid,
        is_revealed: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_round_revealed(id, is_revealed)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_round(id).await.map_err(Into::into) })
    }

    fn upsert_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
        score_value: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_score(team_id, round_id, score_value)
                .await
                .map_err(Into::into)
        })
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_scores(doc! {}).await.map_err(Into::into) })
    }

    fn list_scores_for_round(
        &self,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_scores(doc! {"round_id": bson_uuid(round_id)})
                .await
                .map_err(Into::into)
        })
    }

    fn list_scores_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_scores(doc! {"team_id": bson_uuid(team_id)})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_scores_for_round(&self, round_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_scores(doc! {"round_id": bson_uuid(round_id)})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_all_scores(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete_scores(doc! {}).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
