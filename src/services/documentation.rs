use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::admin::list_rounds,
        crate::routes::admin::create_round,
        crate::routes::admin::set_round_revealed,
        crate::routes::admin::delete_round,
        crate::routes::admin::list_teams,
        crate::routes::admin::create_team,
        crate::routes::admin::reset_teams,
        crate::routes::admin::set_winner,
        crate::routes::admin::list_round_scores,
        crate::routes::admin::upsert_score,
        crate::routes::leaderboard::leaderboard,
        crate::routes::leaderboard::history,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::common::TeamResponse,
            crate::dto::common::RoundResponse,
            crate::dto::common::ScoreResponse,
            crate::dto::admin::NameRequest,
            crate::dto::admin::UpsertScoreRequest,
            crate::dto::admin::RevealRoundRequest,
            crate::dto::admin::WinnerRequest,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::ScoreUpdateResponse,
            crate::dto::admin::RoundScoreEntry,
            crate::dto::admin::TeamRef,
            crate::dto::admin::ResetTeamsResponse,
            crate::dto::leaderboard::HistoryPoint,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Round, team and score management"),
        (name = "leaderboard", description = "Public read-only projections"),
    )
)]
pub struct ApiDoc;
