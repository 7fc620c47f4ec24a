pub mod api;
pub mod api2;
pub mod page;

use axum::{extract::Extension, routing::get, Router};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index::handler))
        .route("/health", get(health))
        .route("/api/xzc_price", get(api::cached::index::xzc_price))
        .route("/api/getblocktemplate", get(api::cached::index::getblocktemplate))
        .route("/api/znode/count", get(api::cached::index::znode_count))
        .route("/api/getznodelist", get(api::cached::index::getznodelist))
        .route("/api/getprotxlist", get(api::cached::index::getprotxlist))
        .route("/api/evoznode/winners", get(api::evoznode::winners::index::handler))
        .route("/api2/znode/{address}", get(api2::znode::lookup::index::handler))
        .layer(Extension(state))
}

async fn health() -> &'static str {
    "OK"
}
