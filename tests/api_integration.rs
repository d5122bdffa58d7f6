//! Integration tests for the HTTP API
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot` against an
//! offline backend.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use linguaquest::config::GameConfig;
use linguaquest::core::{create_router, OfflineRemote};

fn app() -> Router {
    create_router(GameConfig::default(), Arc::new(OfflineRemote))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn new_game(app: &Router) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/game/new",
        Some(json!({ "category": "food", "difficulty": "easy", "language": "ewe" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["game_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["games_active"], 0);
}

#[tokio::test]
async fn test_create_game() {
    let app = app();
    let (status, json) = send(
        &app,
        "POST",
        "/game/new",
        Some(json!({ "category": "Travel", "difficulty": "easy" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let id = json["game_id"].as_str().unwrap();
    assert_eq!(json["websocket_url"], format!("/ws/{}", id));
    assert_eq!(json["snapshot"]["state"], "playing");
    assert_eq!(json["snapshot"]["round"], 1);
    assert_eq!(json["snapshot"]["total_rounds"], 5);
    assert_eq!(json["snapshot"]["time_left_secs"], 50);
    assert_eq!(json["snapshot"]["category"], "travel");
    assert_eq!(json["snapshot"]["language"], "twi");

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["games_active"], 1);
}

#[tokio::test]
async fn test_create_game_blank_category() {
    let app = app();
    let (status, json) = send(
        &app,
        "POST",
        "/game/new",
        Some(json!({ "category": "  ", "difficulty": "easy" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn test_unknown_game() {
    let app = app();
    let (status, json) = send(&app, "GET", "/game/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "unknown game");

    let (status, _) = send(&app, "POST", "/game/nope/next", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_game_snapshot() {
    let app = app();
    let id = new_game(&app).await;
    let (status, json) = send(&app, "GET", &format!("/game/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["language"], "ewe");
    assert!(json["reason"].as_str().unwrap().starts_with('R'));
}

#[tokio::test]
async fn test_translate_requires_argument() {
    let app = app();
    let id = new_game(&app).await;
    let (status, json) = send(&app, "POST", &format!("/game/{}/translate", id), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_argument_then_evaluate() {
    let app = app();
    let id = new_game(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/game/{}/argument", id),
        Some(json!({ "text": "The kenkey there is unmatched" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["argument"], "The kenkey there is unmatched");
    assert!(json.get("voice").is_none());

    let (status, json) = send(
        &app,
        "POST",
        &format!("/game/{}/evaluate?tone=passionate", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["loading"]["evaluation"], true);
}

#[tokio::test]
async fn test_next_rejected_while_playing() {
    let app = app();
    let id = new_game(&app).await;
    let (status, _) = send(&app, "POST", &format!("/game/{}/next", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_voice_transcript() {
    let app = app();
    let id = new_game(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/game/{}/voice", id),
        Some(json!({ "transcript": "Open the SETTINGS please" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["voice"]["kind"], "matched");
    assert_eq!(json["voice"]["action"], "settings");
    assert_eq!(json["voice"]["transcript"], "open the settings please");
    assert_eq!(json["snapshot"]["notice"], "Open settings");

    let (status, json) = send(
        &app,
        "POST",
        &format!("/game/{}/voice", id),
        Some(json!({ "transcript": "sing a song" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["voice"]["kind"], "not_recognized");
}

#[tokio::test]
async fn test_unsupported_language_rejected() {
    let app = app();
    let (status, json) = send(
        &app,
        "POST",
        "/game/new",
        Some(json!({ "category": "food", "difficulty": "easy", "language": "klingon" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("klingon"));

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["games_active"], 0);
}

#[tokio::test]
async fn test_cancel_voice_without_session() {
    let app = app();
    let id = new_game(&app).await;

    let (status, json) = send(&app, "POST", &format!("/game/{}/voice/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["listening"], false);
    assert_eq!(json["snapshot"]["reason"], "R002_STATE_PLAYING");
    assert!(json["snapshot"]["notice"].is_null());
}

#[tokio::test]
async fn test_delete_game() {
    let app = app();
    let id = new_game(&app).await;
    let other = new_game(&app).await;

    let (status, json) = send(&app, "DELETE", &format!("/game/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, _) = send(&app, "GET", &format!("/game/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/game/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["games_active"], 1);
    let (status, _) = send(&app, "GET", &format!("/game/{}", other), None).await;
    assert_eq!(status, StatusCode::OK);
}
