use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{common::TeamResponse, leaderboard::HistoryPoint},
    error::{AppError, ErrorBody},
    services::leaderboard_service,
    state::SharedState,
};

/// Public read-only routes polled by the display.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/leaderboard/history", get(history))
}

/// Teams ranked by total score.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Teams sorted by total descending", body = [TeamResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(leaderboard_service::get_leaderboard(&state).await?))
}

/// Per-round scores for charting, one point per round.
#[utoipa::path(
    get,
    path = "/api/leaderboard/history",
    tag = "leaderboard",
    responses((status = 200, description = "History points in round order", body = [HistoryPoint]))
)]
pub async fn history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<HistoryPoint>>, AppError> {
    Ok(Json(leaderboard_service::get_history(&state).await?))
}
