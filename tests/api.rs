use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use clash_scoreboard_back::{
    config::AppConfig, dao::score_store::memory::MemoryStore, routes, state::AppState,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app_with(config: AppConfig) -> Router {
    let state = AppState::new(config);
    state.install_store(Arc::new(MemoryStore::new())).await;
    routes::router(state)
}

async fn app() -> Router {
    app_with(AppConfig::default()).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_round(app: &Router, name: &str) -> String {
    let (status, body) = send(app, "POST", "/api/admin/rounds", Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_owned()
}

fn team_id(teams: &Value, name: &str) -> String {
    teams
        .as_array()
        .unwrap()
        .iter()
        .find(|team| team["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned()
}

#[tokio::test]
async fn first_team_listing_creates_the_default_roster() {
    let app = app().await;
    let (status, teams) = send(&app, "GET", "/api/admin/teams", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = teams
        .as_array()
        .unwrap()
        .iter()
        .map(|team| team["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["Blue Victorians", "Green Gladiators", "Red Romans", "White Napoleans"]
    );
    assert_eq!(teams[0]["totalScore"], 0);
    assert_eq!(teams[0]["isWinner"], false);
}

#[tokio::test]
async fn scoring_flows_into_leaderboard_and_history() {
    let app = app().await;
    let (_, teams) = send(&app, "GET", "/api/admin/teams", None).await;
    let blue = team_id(&teams, "Blue Victorians");
    let red = team_id(&teams, "Red Romans");
    let r1 = create_round(&app, "R1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/scores",
        Some(json!({"teamId": blue, "roundId": r1, "scoreValue": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Score updated successfully");
    assert_eq!(body["newTotalScore"], 10);
    assert_eq!(body["score"]["scoreValue"], 10);

    send(
        &app,
        "POST",
        "/api/admin/scores",
        Some(json!({"teamId": red, "roundId": r1, "scoreValue": 20})),
    )
    .await;

    let (_, board) = send(&app, "GET", "/api/leaderboard", None).await;
    assert_eq!(board[0]["name"], "Red Romans");
    assert_eq!(board[0]["totalScore"], 20);
    assert_eq!(board[1]["name"], "Blue Victorians");

    let (_, history) = send(&app, "GET", "/api/leaderboard/history", None).await;
    assert_eq!(
        history,
        json!([{
            "time": "R1",
            "isRevealed": false,
            "Blue Victorians": 10,
            "Green Gladiators": 0,
            "Red Romans": 20,
            "White Napoleans": 0
        }])
    );

    let (_, scores) = send(&app, "GET", &format!("/api/admin/scores/{r1}"), None).await;
    assert_eq!(scores.as_array().unwrap().len(), 2);
    assert!(scores.as_array().unwrap().iter().any(|entry| entry["team"]["name"] == "Red Romans"));
}

#[tokio::test]
async fn deleting_a_round_recalculates_totals() {
    let app = app().await;
    let (_, teams) = send(&app, "GET", "/api/admin/teams", None).await;
    let blue = team_id(&teams, "Blue Victorians");
    let r1 = create_round(&app, "R1").await;
    let r2 = create_round(&app, "R2").await;

    for (round, value) in [(&r1, 10), (&r2, 5)] {
        send(
            &app,
            "POST",
            "/api/admin/scores",
            Some(json!({"teamId": blue, "roundId": round, "scoreValue": value})),
        )
        .await;
    }

    let (status, body) = send(&app, "DELETE", &format!("/api/admin/rounds/{r2}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Round deleted and scores recalculated.");

    let (_, board) = send(&app, "GET", "/api/leaderboard", None).await;
    assert_eq!(board[0]["name"], "Blue Victorians");
    assert_eq!(board[0]["totalScore"], 10);

    let (status, body) = send(&app, "GET", &format!("/api/admin/scores/{r2}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, "DELETE", &format!("/api/admin/rounds/{r2}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_requests_answer_with_a_message() {
    let app = app().await;
    create_round(&app, "R1").await;

    let (status, body) = send(&app, "POST", "/api/admin/rounds", Some(json!({"name": "R1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("R1"));

    let (status, body) = send(&app, "POST", "/api/admin/rounds", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(&app, "POST", "/api/admin/scores", Some(json!({"teamId": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/scores",
        Some(json!({
            "teamId": "6f1c2a9e-3a4b-4c5d-8e9f-0a1b2c3d4e5f",
            "roundId": "6f1c2a9e-3a4b-4c5d-8e9f-0a1b2c3d4e60",
            "scoreValue": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reveal_and_winner_flags_round_trip() {
    let app = app().await;
    let (_, teams) = send(&app, "GET", "/api/admin/teams", None).await;
    let green = team_id(&teams, "Green Gladiators");
    let r1 = create_round(&app, "R1").await;

    let (status, round) = send(
        &app,
        "PUT",
        &format!("/api/admin/rounds/{r1}/reveal"),
        Some(json!({"isRevealed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["isRevealed"], true);

    let (status, team) = send(
        &app,
        "PUT",
        &format!("/api/admin/teams/{green}/winner"),
        Some(json!({"isWinner": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["isWinner"], true);

    let (_, board) = send(&app, "GET", "/api/leaderboard", None).await;
    assert!(board.as_array().unwrap().iter().any(|team| team["isWinner"] == true));
}

#[tokio::test]
async fn extra_teams_are_discarded_on_next_listing() {
    let app = app().await;
    send(&app, "GET", "/api/admin/teams", None).await;

    let (status, _) = send(&app, "POST", "/api/admin/teams", Some(json!({"name": "Fifth"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, teams) = send(&app, "GET", "/api/admin/teams", None).await;
    assert_eq!(teams.as_array().unwrap().len(), 4);
    assert!(teams.as_array().unwrap().iter().all(|team| team["name"] != "Fifth"));

    let (status, reset) = send(&app, "POST", "/api/admin/teams/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reset["discardedTeams"], 4);
}

#[tokio::test]
async fn admin_token_guards_admin_routes_only() {
    let app = app_with(AppConfig::default().with_admin_token("s3cret")).await;

    let (status, body) = send(&app, "GET", "/api/admin/rounds", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let request = Request::builder()
        .uri("/api/admin/rounds")
        .header("X-Admin-Token", "s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/leaderboard", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn degraded_state_answers_service_unavailable() {
    let app = routes::router(AppState::new(AppConfig::default()));

    let (status, body) = send(&app, "GET", "/api/leaderboard", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].is_string());

    let (status, body) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn malformed_path_ids_answer_with_a_message() {
    let app = app().await;

    let (status, body) = send(&app, "DELETE", "/api/admin/rounds/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("not-a-uuid"));

    let (status, body) = send(&app, "GET", "/api/admin/scores/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/teams/abc/winner",
        Some(json!({"isWinner": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn history_keys_cannot_be_used_as_team_names() {
    let app = app().await;

    for name in ["time", "isRevealed"] {
        let (status, body) =
            send(&app, "POST", "/api/admin/teams", Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "team named {name}");
        assert!(body["message"].as_str().unwrap().contains("reserved"));
    }
}
