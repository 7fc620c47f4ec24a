use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cache::CacheError;
use crate::sources::CacheKey;
use crate::state::AppState;
use crate::znodes::{lookup_znode, queue_from_value, ViewError};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Cache: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },
    #[error("ListsNotCached")]
    ListsNotCached,
    #[error("ZnodeView: {source}")]
    ZnodeView {
        #[from]
        source: ViewError,
    },
    #[error("ZnodeNotFound: {address}")]
    ZnodeNotFound {
        address: String,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HandlerError::Cache { source } => (StatusCode::SERVICE_UNAVAILABLE, source.to_string()).into_response(),
            HandlerError::ListsNotCached => (StatusCode::BAD_GATEWAY, "znode data is not available".to_string()).into_response(),
            HandlerError::ZnodeView { source } => (StatusCode::BAD_GATEWAY, source.to_string()).into_response(),
            HandlerError::ZnodeNotFound { address } => (StatusCode::NOT_FOUND, format!("No znode found for {address}")).into_response(),
        }
    }
}

/// Axum handler: GET /api2/znode/{address}
pub async fn handler(
    Extension(state): Extension<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let znodelist = state.cache.get(CacheKey::EvoZnodeList.name(), state.max_age).await?;
    let protxlist = state.cache.get(CacheKey::ProTxList.name(), state.max_age).await?;
    let (Some(znodelist), Some(protxlist)) = (znodelist, protxlist) else {
        return Err(HandlerError::ListsNotCached);
    };

    let queue = state.cache.get(CacheKey::Queue.name(), state.max_age).await.ok().flatten();
    let queue = queue_from_value(queue.as_ref());

    debug!(%address, "looking up znode");

    lookup_znode(&address, &znodelist, &protxlist, &queue)?
        .map(Json)
        .ok_or(HandlerError::ZnodeNotFound { address })
}
