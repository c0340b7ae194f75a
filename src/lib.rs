//! Library crate for clash-scoreboard-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Storage entities and backends.
pub mod dao;
/// Request and response records.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers and handlers.
pub mod routes;
/// Business rules.
pub mod services;
/// Shared application state.
pub mod state;
