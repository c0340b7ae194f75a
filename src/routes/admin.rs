use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, NameRequest, ResetTeamsResponse, RevealRoundRequest, RoundScoreEntry,
            ScoreUpdateResponse, UpsertScoreRequest, WinnerRequest,
        },
        common::{RoundResponse, TeamResponse},
    },
    error::{AppError, ErrorBody},
    routes::extract::{ApiJson, ApiPath},
    services::{round_service, score_service, team_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin endpoints for managing rounds, teams and scores.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/admin/rounds", get(list_rounds).post(create_round))
        .route("/api/admin/rounds/{id}", delete(delete_round))
        .route("/api/admin/rounds/{id}/reveal", put(set_round_revealed))
        .route("/api/admin/teams", get(list_teams).post(create_team))
        .route("/api/admin/teams/reset", post(reset_teams))
        .route("/api/admin/teams/{id}/winner", put(set_winner))
        .route("/api/admin/scores", post(upsert_score))
        .route("/api/admin/scores/{round_id}", get(list_round_scores))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// List rounds in creation order.
#[utoipa::path(
    get,
    path = "/api/admin/rounds",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    responses(
        (status = 200, description = "Rounds, oldest first", body = [RoundResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_rounds(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoundResponse>>, AppError> {
    Ok(Json(round_service::list_rounds(&state).await?))
}

/// Create a round with a unique name.
#[utoipa::path(
    post,
    path = "/api/admin/rounds",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Round created", body = RoundResponse),
        (status = 400, description = "Missing or duplicate name", body = ErrorBody)
    )
)]
pub async fn create_round(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<NameRequest>,
) -> Result<(StatusCode, Json<RoundResponse>), AppError> {
    payload.validate()?;
    let round = round_service::create_round(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

/// Show or hide a round on the public history.
#[utoipa::path(
    put,
    path = "/api/admin/rounds/{id}/reveal",
    tag = "admin",
    params(
        ("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    request_body = RevealRoundRequest,
    responses(
        (status = 200, description = "Round updated", body = RoundResponse),
        (status = 404, description = "Unknown round", body = ErrorBody)
    )
)]
pub async fn set_round_revealed(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RevealRoundRequest>,
) -> Result<Json<RoundResponse>, AppError> {
    Ok(Json(
        round_service::set_round_revealed(&state, id, payload.is_revealed).await?,
    ))
}

/// Delete a round, its scores, and recompute every team total.
#[utoipa::path(
    delete,
    path = "/api/admin/rounds/{id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured"),
        ("id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Round deleted", body = ActionResponse),
        (status = 404, description = "Unknown round", body = ErrorBody),
        (status = 503, description = "Cascade interrupted; safe to retry", body = ErrorBody)
    )
)]
pub async fn delete_round(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(round_service::delete_round(&state, id).await?))
}

/// List the teams, resetting the roster first when it does not hold exactly four teams.
#[utoipa::path(
    get,
    path = "/api/admin/teams",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    responses((status = 200, description = "Teams ordered by name", body = [TeamResponse]))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(team_service::list_teams(&state).await?))
}

/// Create a team with a unique name.
#[utoipa::path(
    post,
    path = "/api/admin/teams",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Missing or duplicate name", body = ErrorBody)
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<NameRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), AppError> {
    payload.validate()?;
    let team = team_service::create_team(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Discard every team and score and recreate the default roster.
#[utoipa::path(
    post,
    path = "/api/admin/teams/reset",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    responses((status = 200, description = "Roster reset", body = ResetTeamsResponse))
)]
pub async fn reset_teams(
    State(state): State<SharedState>,
) -> Result<Json<ResetTeamsResponse>, AppError> {
    Ok(Json(team_service::reset_to_default_teams(&state).await?))
}

/// Flag or unflag a team as winner.
#[utoipa::path(
    put,
    path = "/api/admin/teams/{id}/winner",
    tag = "admin",
    params(
        ("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured"),
        ("id" = Uuid, Path, description = "Team identifier")
    ),
    request_body = WinnerRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 404, description = "Unknown team", body = ErrorBody)
    )
)]
pub async fn set_winner(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<WinnerRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    Ok(Json(
        team_service::set_winner(&state, id, payload.is_winner).await?,
    ))
}

/// Scores entered for a round.
#[utoipa::path(
    get,
    path = "/api/admin/scores/{round_id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured"),
        ("round_id" = Uuid, Path, description = "Round identifier")
    ),
    responses(
        (status = 200, description = "Scores of the round", body = [RoundScoreEntry]),
        (status = 404, description = "Unknown round", body = ErrorBody)
    )
)]
pub async fn list_round_scores(
    State(state): State<SharedState>,
    ApiPath(round_id): ApiPath<Uuid>,
) -> Result<Json<Vec<RoundScoreEntry>>, AppError> {
    Ok(Json(
        score_service::list_scores_for_round(&state, round_id).await?,
    ))
}

/// Create or overwrite a team's score for a round.
#[utoipa::path(
    post,
    path = "/api/admin/scores",
    tag = "admin",
    params(("X-Admin-Token" = Option<String>, Header, description = "Required when an admin token is configured")),
    request_body = UpsertScoreRequest,
    responses(
        (status = 200, description = "Score stored and total recomputed", body = ScoreUpdateResponse),
        (status = 404, description = "Unknown team or round", body = ErrorBody)
    )
)]
pub async fn upsert_score(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<UpsertScoreRequest>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    Ok(Json(score_service::upsert_score(&state, payload).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().admin_token() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided != expected {
        return Err(AppError::Unauthorized("invalid admin token".into()));
    }
    Ok(next.run(req).await)
}
