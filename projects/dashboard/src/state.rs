use crate::cache::CacheStore;

/// Shared with every handler through an `Extension` layer.
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: CacheStore,
    pub max_age: chrono::Duration,
    pub public_couchdb: String,
    pub debug: bool,
}
