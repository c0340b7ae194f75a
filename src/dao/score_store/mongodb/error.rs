use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("{entity} `{value}` already exists")]
    Duplicate { entity: &'static str, value: String },
    #[error("failed to save team `{name}`")]
    SaveTeam {
        name: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load teams")]
    LoadTeams {
        #[source]
        source: MongoError,
    },
    #[error("failed to update team `{id}`")]
    UpdateTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete teams")]
    DeleteTeams {
        #[source]
        source: MongoError,
    },
    #[error("failed to save round `{name}`")]
    SaveRound {
        name: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load rounds")]
    LoadRounds {
        #[source]
        source: MongoError,
    },
    #[error("failed to update round `{id}`")]
    UpdateRound {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete round `{id}`")]
    DeleteRound {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to upsert score for team `{team_id}` in round `{round_id}`")]
    UpsertScore {
        team_id: Uuid,
        round_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to draw the next round sequence number")]
    NextSequence {
        #[source]
        source: MongoError,
    },
    #[error("round counter document has no `seq` value")]
    MissingSequence,
    #[error("upsert returned no score for team `{team_id}` in round `{round_id}`")]
    MissingUpsertResult { team_id: Uuid, round_id: Uuid },
    #[error("failed to load scores")]
    LoadScores {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete scores")]
    DeleteScores {
        #[source]
        source: MongoError,
    },
}

/// Whether `err` reports a unique index violation (E11000).
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
