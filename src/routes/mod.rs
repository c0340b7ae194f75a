use axum::Router;

use crate::state::SharedState;

/// Token-guarded round, team and score management.
pub mod admin;
/// Swagger UI.
pub mod docs;
/// Extractors answering rejections as `{message}`.
pub mod extract;
/// Health probe.
pub mod health;
/// Public leaderboard projections.
pub mod leaderboard;

/// Compose all route trees and attach the shared state.
///
/// Admin routes carry their own token layer; public and documentation routes are open.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(admin::router(state.clone()))
        .merge(leaderboard::router())
        .merge(docs::router())
        .with_state(state)
}
