//! HTTP + WebSocket API for LinguaQuest
//!
//! Endpoints:
//! - POST /game/new - Start a game
//! - GET /game/{id} - Current snapshot
//! - DELETE /game/{id} - End a game and release its driver
//! - POST /game/{id}/argument - Submit argument text
//! - POST /game/{id}/translate - Translate the argument
//! - POST /game/{id}/evaluate - Score the argument (?tone=)
//! - POST /game/{id}/dialogue - Ask the AI character
//! - POST /game/{id}/next - Skip to the next round
//! - POST /game/{id}/voice - Interpret a spoken transcript
//! - POST /game/{id}/voice/cancel - Stop listening
//! - WS /ws/{id} - Live snapshots; text frames are voice transcripts
//! - GET /health - Health check

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::GameConfig;
use crate::core::{CommandReply, GameCommand, GameDriver, GameHandle, RemoteOps, VoiceController};
use crate::types::{generate_session_id, GameError, RoundSnapshot, SessionContext, Tone};

/// App state
pub struct AppState {
    pub games: RwLock<HashMap<String, GameHandle>>,
    pub config: GameConfig,
    pub remote: Arc<dyn RemoteOps>,
}

impl AppState {
    pub fn new(config: GameConfig, remote: Arc<dyn RemoteOps>) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            config,
            remote,
        }
    }

    async fn handle(&self, id: &str) -> Result<GameHandle, ApiError> {
        let games = self.games.read().await;
        games.get(id).cloned().ok_or(ApiError::NotFound)
    }
}

/// Start game request
#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    pub category: String,
    pub difficulty: String,
    pub language: Option<String>,
    pub nickname: Option<String>,
    pub tone: Option<Tone>,
    pub voice_language: Option<String>,
}

/// Start game response
#[derive(Debug, Serialize)]
pub struct NewGameResponse {
    pub game_id: String,
    pub websocket_url: String,
    pub snapshot: RoundSnapshot,
}

/// Submit argument request
#[derive(Debug, Deserialize)]
pub struct ArgumentRequest {
    pub text: String,
}

/// Evaluate query
#[derive(Debug, Deserialize)]
pub struct EvaluateQuery {
    pub tone: Option<Tone>,
}

/// Voice transcript request
#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub transcript: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub games_active: usize,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failure
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Game(GameError),
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        ApiError::Game(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "unknown game".to_string()),
            ApiError::Game(e) => (status_for(&e), e.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Map game errors to HTTP status
fn status_for(error: &GameError) -> StatusCode {
    match error {
        e if e.is_rejection() => StatusCode::CONFLICT,
        GameError::StaleResponse { .. } => StatusCode::CONFLICT,
        GameError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
        GameError::Voice(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GameError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
        GameError::SessionClosed => StatusCode::GONE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create the API router
pub fn create_router(config: GameConfig, remote: Arc<dyn RemoteOps>) -> Router {
    let state = Arc::new(AppState::new(config, remote));

    Router::new()
        .route("/health", get(health))
        .route("/game/new", post(create_game))
        .route("/game/:id", get(get_game).delete(delete_game))
        .route("/game/:id/argument", post(submit_argument))
        .route("/game/:id/translate", post(translate))
        .route("/game/:id/evaluate", post(evaluate))
        .route("/game/:id/dialogue", post(dialogue))
        .route("/game/:id/next", post(next_round))
        .route("/game/:id/voice", post(voice))
        .route("/game/:id/voice/cancel", post(cancel_voice))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let games = state.games.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        games_active: games.len(),
    })
}

/// Start a new game with its own driver
async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewGameRequest>,
) -> Result<Json<NewGameResponse>, ApiError> {
    let mut context = match req.nickname {
        Some(nickname) if !nickname.trim().is_empty() => SessionContext::for_player(nickname.trim()),
        _ => SessionContext::default(),
    };
    if let Some(tone) = req.tone {
        context = context.with_tone(tone);
    }
    if let Some(tag) = req.voice_language {
        context = context.with_voice_language(tag);
    }

    let voice = VoiceController::unsupported(context.voice_language.clone(), state.config.voice_timeout());
    let handle = GameDriver::spawn(
        state.config.clone(),
        context,
        state.remote.clone(),
        Arc::new(voice),
    );
    let snapshot = handle
        .new_game(&req.category, &req.difficulty, req.language.as_deref())
        .await?;

    let game_id = generate_session_id();
    let mut games = state.games.write().await;
    games.insert(game_id.clone(), handle);

    Ok(Json(NewGameResponse {
        websocket_url: format!("/ws/{}", game_id),
        game_id,
        snapshot,
    }))
}

/// Get game snapshot
async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    let handle = state.handle(&id).await?;
    Ok(Json(handle.snapshot().await?))
}

/// Drop the registry's handle; the driver stops once no socket holds one
async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut games = state.games.write().await;
    match games.remove(&id) {
        Some(_) => {
            log::debug!("game {} removed, {} active", id, games.len());
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound),
    }
}

async fn submit_argument(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ArgumentRequest>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::SubmitArgument(req.text)).await
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::Translate).await
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<EvaluateQuery>,
) -> Result<Json<CommandReply>, ApiError> {
    let handle = state.handle(&id).await?;
    if let Some(tone) = query.tone {
        handle.dispatch(GameCommand::SetTone(tone)).await?;
    }
    Ok(Json(handle.dispatch(GameCommand::Evaluate).await?))
}

async fn dialogue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::Dialogue).await
}

async fn next_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::Next).await
}

async fn voice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VoiceRequest>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::VoiceTranscript(req.transcript)).await
}

async fn cancel_voice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommandReply>, ApiError> {
    run(&state, &id, GameCommand::CancelListen).await
}

async fn run(state: &AppState, id: &str, command: GameCommand) -> Result<Json<CommandReply>, ApiError> {
    let handle = state.handle(id).await?;
    Ok(Json(handle.dispatch(command).await?))
}

/// WebSocket handler for live snapshots
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.handle(&id).await?;
    let current = handle.snapshot().await?;

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, current, handle).await;
    }))
}

/// Push the current snapshot, then every update.
/// Text frames from the client are voice transcripts.
async fn handle_websocket(socket: WebSocket, current: RoundSnapshot, handle: GameHandle) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = handle.subscribe();

    let mut send_task = tokio::spawn(async move {
        let json = serde_json::to_string(&current).unwrap_or_default();
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    let json = serde_json::to_string(&snapshot).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("websocket lagged by {} snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(transcript) => {
                    // Outcome arrives through the snapshot stream
                    if let Err(e) = handle.dispatch(GameCommand::VoiceTranscript(transcript)).await {
                        log::debug!("websocket voice command failed: {}", e);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    config: GameConfig,
    remote: Arc<dyn RemoteOps>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config, remote);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("🗣  LinguaQuest API running on {}", addr);
    println!("  POST /game/new            - Start game");
    println!("  GET  /game/:id            - Snapshot");
    println!("  DELETE /game/:id          - End game");
    println!("  POST /game/:id/argument   - Submit argument");
    println!("  POST /game/:id/translate  - Translate argument");
    println!("  POST /game/:id/evaluate   - Evaluate argument");
    println!("  POST /game/:id/dialogue   - AI reply");
    println!("  POST /game/:id/next       - Next round");
    println!("  POST /game/:id/voice      - Voice command");
    println!("  POST /game/:id/voice/cancel - Stop listening");
    println!("  WS   /ws/:id              - Live updates");
    println!("  GET  /health              - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
