use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheError;
use crate::sources::CacheKey;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Cache: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },
    #[error("NotCached: {name}")]
    NotCached {
        name: &'static str,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HandlerError::Cache { source } => (StatusCode::SERVICE_UNAVAILABLE, source.to_string()).into_response(),
            HandlerError::NotCached { name } => (StatusCode::SERVICE_UNAVAILABLE, format!("{name} is not cached yet")).into_response(),
        }
    }
}

pub async fn read_cached(state: &AppState, key: CacheKey) -> Result<Value, HandlerError> {
    state
        .cache
        .get(key.name(), state.max_age)
        .await?
        .ok_or(HandlerError::NotCached { name: key.name() })
}

/// Axum handler: GET /api/xzc_price, plain text.
pub async fn xzc_price(Extension(state): Extension<AppState>) -> Result<String, HandlerError> {
    match read_cached(&state, CacheKey::XzcPrice).await? {
        Value::String(price) => Ok(price),
        other => Ok(other.to_string()),
    }
}

/// Axum handler: GET /api/getblocktemplate
pub async fn getblocktemplate(Extension(state): Extension<AppState>) -> Result<Json<Value>, HandlerError> {
    Ok(Json(read_cached(&state, CacheKey::BlockTemplate).await?))
}

/// Axum handler: GET /api/znode/count
pub async fn znode_count(Extension(state): Extension<AppState>) -> Result<Json<Value>, HandlerError> {
    Ok(Json(read_cached(&state, CacheKey::ZnodeCount).await?))
}

/// Axum handler: GET /api/getznodelist
pub async fn getznodelist(Extension(state): Extension<AppState>) -> Result<Json<Value>, HandlerError> {
    Ok(Json(read_cached(&state, CacheKey::EvoZnodeList).await?))
}

/// Axum handler: GET /api/getprotxlist
pub async fn getprotxlist(Extension(state): Extension<AppState>) -> Result<Json<Value>, HandlerError> {
    Ok(Json(read_cached(&state, CacheKey::ProTxList).await?))
}
