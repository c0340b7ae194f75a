mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchScoreStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Duplicate { entity, value } => StorageError::duplicate(entity, value),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
