use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use thiserror::Error;

use crate::endpoints::api::cached::index::{read_cached, HandlerError as CachedError};
use crate::sources::CacheKey;
use crate::state::AppState;
use crate::znodes::{queue_from_value, winners_view, ViewError};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Cached {
        #[from]
        source: CachedError,
    },
    #[error("WinnersView: {source}")]
    WinnersView {
        #[from]
        source: ViewError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HandlerError::Cached { source } => source.into_response(),
            HandlerError::WinnersView { source } => (StatusCode::BAD_GATEWAY, source.to_string()).into_response(),
        }
    }
}

/// Axum handler: GET /api/evoznode/winners
pub async fn handler(Extension(state): Extension<AppState>) -> Result<Json<Vec<Value>>, HandlerError> {
    let winners = read_cached(&state, CacheKey::Winners).await?;
    let protxlist = read_cached(&state, CacheKey::ProTxList).await?;
    let znodelist = read_cached(&state, CacheKey::EvoZnodeList).await?;

    // a missing queue only costs the positions, they come back as -1
    let queue = read_cached(&state, CacheKey::Queue).await.ok();
    let queue = queue_from_value(queue.as_ref());

    let view = winners_view(&winners, &znodelist, &protxlist, &queue)?;

    Ok(Json(view))
}
