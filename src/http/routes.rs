//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::app::AppState;
use crate::game::types::InvalidDirection;
use crate::game::{Direction, WorldSnapshot};
use crate::store::{PlayerProfile, Skin, StoreError};
use crate::util::time::{unix_millis, uptime_secs};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/game", get(game_state_handler).post(game_action_handler))
        .route("/shop", get(shop_handler).post(shop_action_handler))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS configuration - comma-separated origins; any `*` entry allows every origin
fn cors_layer(client_origin: &str) -> CorsLayer {
    let entries: Vec<&str> = client_origin
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let origin = if entries.contains(&"*") {
        AllowOrigin::any()
    } else {
        let mut allowed = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.parse::<HeaderValue>() {
                Ok(value) => allowed.push(value),
                Err(_) => warn!(origin = entry, "Ignoring unparseable CORS origin"),
            }
        }
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-player-id")])
        .max_age(Duration::from_secs(86400))
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    players: usize,
    alive_players: usize,
    started: bool,
    shop_backend: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (players, alive_players, started) = state.world.status();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        players,
        alive_players,
        started,
        shop_backend: state.shop.backend(),
    })
}

// ============================================================================
// Game endpoints
// ============================================================================

/// Every poll advances the world first, so clients pace the ticks
async fn game_state_handler(State(state): State<AppState>) -> Json<WorldSnapshot> {
    Json(state.world.snapshot(unix_millis()))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum GameAction {
    #[serde(rename_all = "camelCase")]
    Join { player_id: String },
    #[serde(rename_all = "camelCase")]
    Move { player_id: String, direction: String },
    #[serde(rename_all = "camelCase")]
    Leave { player_id: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinResponse {
    success: bool,
    player_id: String,
    color: &'static str,
    waiting: bool,
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

async fn game_action_handler(
    State(state): State<AppState>,
    payload: Result<Json<GameAction>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(action) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    match action {
        GameAction::Join { player_id } => {
            let player_id = require_player_id(player_id)?;
            let outcome = state.world.join(&player_id);
            Ok(Json(JoinResponse {
                success: true,
                player_id,
                color: outcome.color,
                waiting: outcome.waiting,
            })
            .into_response())
        }
        GameAction::Move {
            player_id,
            direction,
        } => {
            let player_id = require_player_id(player_id)?;
            let direction: Direction = direction
                .parse()
                .map_err(|e: InvalidDirection| AppError::BadRequest(e.to_string()))?;
            state.world.set_direction(&player_id, direction);
            Ok(Json(AckResponse { success: true }).into_response())
        }
        GameAction::Leave { player_id } => {
            let player_id = require_player_id(player_id)?;
            state.world.leave(&player_id);
            Ok(Json(AckResponse { success: true }).into_response())
        }
    }
}

fn require_player_id(player_id: String) -> Result<String, AppError> {
    if player_id.trim().is_empty() {
        return Err(AppError::BadRequest("playerId is required".to_string()));
    }
    Ok(player_id)
}

// ============================================================================
// Shop endpoints
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShopQuery {
    player_id: Option<String>,
}

#[derive(Serialize)]
struct ShopResponse {
    skins: Vec<Skin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    player: Option<PlayerProfile>,
}

async fn shop_handler(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<ShopResponse>, AppError> {
    let skins = state.shop.list_skins().await?;

    let player = match query.player_id.filter(|id| !id.trim().is_empty()) {
        Some(player_id) => Some(state.shop.get_or_create(&player_id).await?),
        None => None,
    };

    Ok(Json(ShopResponse { skins, player }))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ShopAction {
    #[serde(rename_all = "camelCase")]
    Purchase { player_id: String, skin_id: i32 },
    #[serde(rename_all = "camelCase")]
    Activate { player_id: String, skin_id: i32 },
    #[serde(rename_all = "camelCase")]
    AddCoins {
        player_id: String,
        #[serde(default)]
        amount: i64,
        #[serde(default)]
        score: i64,
    },
}

#[derive(Serialize)]
struct ShopActionResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    skin_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coins: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ShopActionResponse {
    fn ok() -> Self {
        Self {
            success: true,
            skin_id: None,
            coins: None,
            error: None,
        }
    }

    /// Purchase and activation refusals are answered with 200 and `success: false`
    fn from_skin_result(skin_id: i32, result: Result<(), StoreError>) -> Result<Self, AppError> {
        match result {
            Ok(()) => Ok(Self {
                skin_id: Some(skin_id),
                ..Self::ok()
            }),
            Err(e) if e.is_rejection() => Ok(Self {
                success: false,
                error: Some(e.to_string()),
                ..Self::ok()
            }),
            Err(e) => Err(e.into()),
        }
    }
}

async fn shop_action_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShopAction>, JsonRejection>,
) -> Result<Json<ShopActionResponse>, AppError> {
    let Json(action) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let response = match action {
        ShopAction::Purchase { player_id, skin_id } => {
            let player_id = require_player_id(player_id)?;
            let result = state.shop.purchase(&player_id, skin_id).await;
            if result.is_ok() {
                info!(player_id = %player_id, skin_id, "Skin purchased");
            }
            ShopActionResponse::from_skin_result(skin_id, result)?
        }
        ShopAction::Activate { player_id, skin_id } => {
            let player_id = require_player_id(player_id)?;
            let result = state.shop.activate(&player_id, skin_id).await;
            ShopActionResponse::from_skin_result(skin_id, result)?
        }
        ShopAction::AddCoins {
            player_id,
            amount,
            score,
        } => {
            let player_id = require_player_id(player_id)?;
            match state
                .shop
                .credit_coins_and_score(&player_id, amount, score)
                .await
            {
                Ok(coins) => ShopActionResponse {
                    coins: Some(coins),
                    ..ShopActionResponse::ok()
                },
                Err(e) if e.is_rejection() => ShopActionResponse {
                    success: false,
                    error: Some(e.to_string()),
                    ..ShopActionResponse::ok()
                },
                Err(e) => return Err(e.into()),
            }
        }
    };

    Ok(Json(response))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        warn!(error = %e, "Shop store failure");
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
