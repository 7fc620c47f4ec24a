use std::net::SocketAddr;

use axum::serve;
use interfaces_exchange_ticker::index::TickerClient;
use interfaces_zcoin_rpc::index::ZcoinRpcClient;
use projects_dashboard::cache::CacheStore;
use projects_dashboard::config::{Config, ConfigError};
use projects_dashboard::endpoints::router;
use projects_dashboard::refresh::spawn_refreshers;
use projects_dashboard::sources::Sources;
use projects_dashboard::state::AppState;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MainError {
	#[error("Config: {source}")]
	Config {
		#[source]
		source: ConfigError,
	},
	#[error("TracingInit: {source}")]
	TracingInit {
		#[source]
		source: utils_trace::TracingInitError,
	},
	#[error("TcpListenerBind: {source}")]
	TcpListenerBind {
		#[source]
		source: std::io::Error,
	},
	#[error("Serve: {source}")]
	Serve {
		#[source]
		source: std::io::Error,
	},
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
	let config = Config::from_env().map_err(|source| MainError::Config { source })?;

	utils_trace::init(config.log_level(), config.log_format)
		.map_err(|source| MainError::TracingInit { source })?;

	let cache = CacheStore::new();

	let sources = Sources {
		rpc: ZcoinRpcClient::new(&config.rpc),
		ticker: TickerClient::new(&config.exchange_base_url),
		cache: cache.clone(),
		max_age: config.cache_max_age,
	};
	spawn_refreshers(sources, config.refresh_interval, config.refresh_spread);

	let app = router(AppState {
		cache,
		max_age: config.cache_max_age,
		public_couchdb: config.public_couchdb.clone(),
		debug: config.debug,
	});

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.map_err(|source| MainError::TcpListenerBind { source })?;

	info!("Server running on addr: {}", addr);

	serve(listener, app)
		.await
		.map_err(|source| MainError::Serve { source })?;

	Ok(())
}
