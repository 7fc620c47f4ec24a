use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Connection settings for a zcoind JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct ZcoinRpcConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl ZcoinRpcConfig {
    pub fn url(&self) -> String {
        format!("{}://{}:{}/", self.protocol, self.host, self.port)
    }
}

/// Thin pass-through client: every call returns the daemon's `result` untouched.
#[derive(Debug, Clone)]
pub struct ZcoinRpcClient {
    http: Client,
    url: String,
    user: String,
    password: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl ZcoinRpcClient {
    pub fn new(config: &ZcoinRpcConfig) -> Self {
        Self::with_url(config.url(), &config.user, &config.password)
    }

    pub fn with_url(url: impl Into<String>, user: &str, password: &str) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            user: user.to_string(),
            password: password.to_string(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "zcoind rpc call");

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .await
            .map_err(|source| CallError::RequestSend { source })?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|source| CallError::ResponseRead { source })?;

        // zcoind answers RPC errors with a 500 and a regular envelope
        let mut envelope: Map<String, Value> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(CallError::HttpStatus { status, body });
            }
            Err(source) => return Err(CallError::DeserializeResponseBody { source }),
        };

        match envelope.remove("error") {
            None | Some(Value::Null) => {}
            Some(error) => match serde_json::from_value::<RpcErrorObject>(error) {
                Ok(RpcErrorObject { code, message }) => {
                    return Err(CallError::Rpc {
                        method: method.to_string(),
                        code,
                        message,
                    });
                }
                Err(_) if !status.is_success() => {
                    return Err(CallError::HttpStatus { status, body });
                }
                Err(source) => return Err(CallError::DeserializeResponseBody { source }),
            },
        }

        if !status.is_success() {
            return Err(CallError::HttpStatus { status, body });
        }

        envelope
            .remove("result")
            .ok_or(CallError::MalformedEnvelope { body })
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("HttpStatus: {status} {body}")]
    HttpStatus {
        status: StatusCode,
        body: String,
    },

    #[error("DeserializeResponseBody: {source}")]
    DeserializeResponseBody {
        source: serde_json::Error,
    },

    #[error("MalformedEnvelope: no result member in {body}")]
    MalformedEnvelope {
        body: String,
    },

    #[error("Rpc: {method} failed with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_built_from_parts() {
        let config = ZcoinRpcConfig {
            protocol: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8888,
            user: "u".to_string(),
            password: "p".to_string(),
        };
        assert_eq!(config.url(), "http://127.0.0.1:8888/");
    }
}
