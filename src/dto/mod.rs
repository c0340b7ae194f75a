use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Admin request and response records.
pub mod admin;
/// Team, round and score records.
pub mod common;
/// Health probe payload.
pub mod health;
/// History chart points.
pub mod leaderboard;
/// Name validation helpers.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
