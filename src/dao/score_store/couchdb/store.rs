use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dao::{
    models::{RoundEntity, ScoreEntity, TeamEntity},
    score_store::ScoreboardStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchCounter, CouchNameClaim, CouchRoundDocument, CouchScoreDocument,
        CouchTeamDocument, END_SUFFIX, PutResponse, ROUND_COUNTER_ID, ROUND_PREFIX,
        RevisionedDocument, SCORE_PREFIX, TEAM_NAME_PREFIX, TEAM_PREFIX, round_doc_id,
        round_name_doc_id, score_doc_id, team_doc_id, team_name_doc_id, team_score_prefix,
    },
};

/// Revision conflicts are retried this many times before giving up.
const CONFLICT_ATTEMPTS: u32 = 5;

/// CouchDB-backed [`ScoreboardStore`] implementation.
#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchScoreStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Write a document; a missing or stale `_rev` surfaces as [`CouchDaoError::Conflict`].
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            status if status.is_success() => response
                .json::<PutResponse>()
                .await
                .map(|put| put.rev)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<bool> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    /// Delete every document under `prefix`, returning how many went away.
    async fn purge_prefix(&self, prefix: &str) -> CouchResult<u64> {
        let documents = self.list_documents::<RevisionedDocument>(prefix).await?;
        let mut removed = 0;
        for document in documents {
            if self.delete_document(&document.id, &document.rev).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Reserve `claim_id` for `owner`; an existing claim means the name is taken.
    async fn claim_name(
        &self,
        entity: &'static str,
        name: &str,
        claim_id: String,
        owner: Uuid,
    ) -> CouchResult<()> {
        let claim = CouchNameClaim::new(claim_id, owner);
        match self.put_document(&claim.id, &claim).await {
            Ok(_) => Ok(()),
            Err(CouchDaoError::Conflict { .. }) => Err(CouchDaoError::Duplicate {
                entity,
                value: name.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn release_name(&self, claim_id: &str) {
        let released = match self.get_document::<RevisionedDocument>(claim_id).await {
            Ok(Some(claim)) => self.delete_document(&claim.id, &claim.rev).await.map(|_| ()),
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = released {
            warn!(claim_id, error = %err, "failed to release name claim");
        }
    }

    async fn insert_team(&self, team: TeamEntity) -> CouchResult<()> {
        let claim_id = team_name_doc_id(&team.name);
        self.claim_name("team", &team.name, claim_id.clone(), team.id)
            .await?;

        let document = CouchTeamDocument::from(team);
        if let Err(err) = self.put_document(&document.id, &document).await {
            self.release_name(&claim_id).await;
            return Err(err);
        }
        Ok(())
    }

    async fn update_team(
        &self,
        id: Uuid,
        update: impl Fn(&mut TeamEntity),
    ) -> CouchResult<bool> {
        let doc_id = team_doc_id(id);
        for attempt in 1..=CONFLICT_ATTEMPTS {
            let Some(mut document) = self.get_document::<CouchTeamDocument>(&doc_id).await?
            else {
                return Ok(false);
            };
            update(&mut document.team);
            document.team.updated_at = SystemTime::now();

            match self.put_document(&doc_id, &document).await {
                Ok(_) => return Ok(true),
                Err(CouchDaoError::Conflict { .. }) => {
                    debug!(%id, attempt, "team revision conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: CONFLICT_ATTEMPTS,
        })
    }

    /// Bump the round counter, retrying on revision conflicts.
    async fn next_round_sequence(&self) -> CouchResult<u64> {
        for attempt in 1..=CONFLICT_ATTEMPTS {
            let mut counter = self
                .get_document::<CouchCounter>(ROUND_COUNTER_ID)
                .await?
                .unwrap_or_else(|| CouchCounter {
                    id: ROUND_COUNTER_ID.to_string(),
                    rev: None,
                    seq: 0,
                });
            counter.seq += 1;

            match self.put_document(ROUND_COUNTER_ID, &counter).await {
                Ok(_) => return Ok(counter.seq),
                Err(CouchDaoError::Conflict { .. }) => {
                    debug!(attempt, "round counter conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(CouchDaoError::ConflictRetriesExhausted {
            path: ROUND_COUNTER_ID.to_string(),
            attempts: CONFLICT_ATTEMPTS,
        })
    }

    async fn insert_round(&self, round: RoundEntity) -> CouchResult<()> {
        let claim_id = round_name_doc_id(&round.name);
        self.claim_name("round", &round.name, claim_id.clone(), round.id)
            .await?;

        let sequence = match self.next_round_sequence().await {
            Ok(sequence) => sequence,
            Err(err) => {
                self.release_name(&claim_id).await;
                return Err(err);
            }
        };
        let mut document = CouchRoundDocument::from(round);
        document.sequence = sequence;
        if let Err(err) = self.put_document(&document.id, &document).await {
            self.release_name(&claim_id).await;
            return Err(err);
        }
        Ok(())
    }

    async fn list_rounds(&self) -> CouchResult<Vec<RoundEntity>> {
        let mut documents = self
            .list_documents::<CouchRoundDocument>(ROUND_PREFIX)
            .await?;
        documents.sort_by_key(|doc| doc.sequence);
        Ok(documents.into_iter().map(|doc| doc.round).collect())
    }

    async fn set_round_revealed(&self, id: Uuid, is_revealed: bool) -> CouchResult<bool> {
        let doc_id = round_doc_id(id);
        for attempt in 1..=CONFLICT_ATTEMPTS {
            let Some(mut document) = self.get_document::<CouchRoundDocument>(&doc_id).await?
            else {
                return Ok(false);
            };
            document.round.is_revealed = is_revealed;
            document.round.updated_at = SystemTime::now();

            match self.put_document(&doc_id, &document).await {
                Ok(_) => return Ok(true),
                Err(CouchDaoError::Conflict { .. }) => {
                    debug!(%id, attempt, "round revision conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }
        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: CONFLICT_ATTEMPTS,
        })
    }

    async fn delete_round(&self, id: Uuid) -> CouchResult<bool> {
        let doc_id = round_doc_id(id);
        let Some(document) = self.get_document::<CouchRoundDocument>(&doc_id).await? else {
            return Ok(false);
        };
        let Some(rev) = document.rev.as_deref() else {
            return Ok(false);
        };
        let deleted = self.delete_document(&doc_id, rev).await?;
        self.release_name(&round_name_doc_id(&document.round.name))
            .await;
        Ok(deleted)
    }

    async fn upsert_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
        score_value: i64,
    ) -> CouchResult<ScoreEntity> {
        let doc_id = score_doc_id(team_id, round_id);
        for attempt in 1..=CONFLICT_ATTEMPTS {
            let document = match self.get_document::<CouchScoreDocument>(&doc_id).await? {
                Some(mut existing) => {
                    existing.score.score_value = score_value;
                    existing.score.updated_at = SystemTime::now();
                    existing
                }
                None => ScoreEntity::new(team_id, round_id, score_value).into(),
            };

            match self.put_document(&doc_id, &document).await {
                Ok(_) => return Ok(document.score),
                Err(CouchDaoError::Conflict { .. }) => {
                    debug!(%team_id, %round_id, attempt, "score revision conflict; retrying as update");
                }
                Err(err) => return Err(err),
            }
        }
        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: CONFLICT_ATTEMPTS,
        })
    }

    async fn scores_with_prefix(&self, prefix: &str) -> CouchResult<Vec<CouchScoreDocument>> {
        let mut documents = self.list_documents::<CouchScoreDocument>(prefix).await?;
        documents.sort_by(|a, b| a.score.created_at.cmp(&b.score.created_at));
        Ok(documents)
    }
}

impl ScoreboardStore for CouchScoreStore {
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut teams: Vec<TeamEntity> = store
                .list_documents::<CouchTeamDocument>(TEAM_PREFIX)
                .await?
                .into_iter()
                .map(|doc| doc.team)
                .collect();
            teams.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(teams)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchTeamDocument>(&team_doc_id(id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.team))
        })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_team(team).await.map_err(Into::into) })
    }

    fn delete_all_teams(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store.purge_prefix(TEAM_PREFIX).await?;
            store.purge_prefix(TEAM_NAME_PREFIX).await?;
            Ok(removed)
        })
    }

    fn set_team_total(&self, id: Uuid, total: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_team(id, |team| team.total_score = total)
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
                .update_team(id, |team| team.is_winner = is_winner)
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
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<CouchRoundDocument>(&round_doc_id(id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.round))
        })
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
        Box::pin(async move {
            let documents = store.scores_with_prefix(SCORE_PREFIX).await?;
            Ok(documents.into_iter().map(|doc| doc.score).collect())
        })
    }

    fn list_scores_for_round(
        &self,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store.scores_with_prefix(SCORE_PREFIX).await?;
            Ok(documents
                .into_iter()
                .map(|doc| doc.score)
                .filter(|score| score.round_id == round_id)
                .collect())
        })
    }

    fn list_scores_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store.scores_with_prefix(&team_score_prefix(team_id)).await?;
            Ok(documents.into_iter().map(|doc| doc.score).collect())
        })
    }

    fn delete_scores_for_round(&self, round_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store.scores_with_prefix(SCORE_PREFIX).await?;
            let mut removed = 0;
            for document in documents
                .into_iter()
                .filter(|doc| doc.score.round_id == round_id)
            {
                let Some(rev) = document.rev.as_deref() else {
                    continue;
                };
                if store.delete_document(&document.id, rev).await? {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn delete_all_scores(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.purge_prefix(SCORE_PREFIX).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
