//! REST endpoints

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use tokenagg_aggregator::TokenQuery;
use tokenagg_core::SortKey;

use crate::conversions::TokenSnapshot;
use crate::state::AppState;
use crate::ws;

/// Errors surfaced to HTTP clients with a generic body
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Internal Server Error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/api/tokens", get(list_tokens))
        .route("/api/tokens/:address", get(get_token))
        .route("/api/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Raw query string; every field is optional and leniently parsed
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub query: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl From<ListParams> for TokenQuery {
    fn from(params: ListParams) -> Self {
        Self {
            query: params.query,
            sort: SortKey::from_param(params.sort.as_deref()),
            limit: params.limit.and_then(|l| l.trim().parse().ok()),
            cursor: params.cursor.filter(|c| !c.is_empty()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub cache: String,
}

async fn list_tokens(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<TokenListResponse> {
    let page = state.aggregator.get_tokens(params.into()).await;

    Json(TokenListResponse {
        tokens: page.items.iter().map(TokenSnapshot::from).collect(),
        next_cursor: page.next_cursor,
    })
}

/// Single token lookup; a found token joins the refresh set
async fn get_token(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<TokenSnapshot>, ApiError> {
    let record = state
        .aggregator
        .get_token(&address)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;

    info!("Lookup for {} ({})", record.symbol, address);
    state.refresh.track(&address);

    Ok(Json(TokenSnapshot::from(&record)))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        cache: state.cache.mode().name().to_string(),
    })
}
