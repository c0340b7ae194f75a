/// Database model definitions.
pub mod models;
/// Team, round and score persistence behind a pluggable store.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
