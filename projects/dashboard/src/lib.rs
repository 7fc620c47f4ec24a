//! Znode dashboard service
//!
//! - Polls zcoind and the exchange ticker in `refresh`, keeping results in `cache`
//! - Payment queue scoring in `queue`, joined views in `znodes`
//! - REST API endpoints and the index page in `endpoints/`
//! - Requires ZCOIN_RPC_USER and ZCOIN_RPC_PASSWORD env vars for RPC access

pub mod cache;
pub mod config;
pub mod endpoints;
pub mod queue;
pub mod refresh;
pub mod scan;
pub mod sources;
pub mod state;
pub mod znodes;
