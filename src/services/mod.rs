/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Public leaderboard and history projections.
pub mod leaderboard_service;
/// Round registry and the round deletion cascade.
pub mod round_service;
/// Score ledger operations.
pub mod score_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
/// Team registry with default-roster healing.
pub mod team_service;
/// Team total aggregation.
pub mod totals;
