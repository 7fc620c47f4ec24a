use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Just enough of the CouchDB document API to upsert flat documents.
#[derive(Debug, Clone)]
pub struct CouchClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RevisionOnly {
    #[serde(rename = "_rev")]
    rev: String,
}

impl CouchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates the database unless it already exists.
    pub async fn ensure_database(&self, db: &str) -> Result<(), EnsureDatabaseError> {
        let response = self
            .http
            .put(format!("{}/{db}", self.base_url))
            .send()
            .await
            .map_err(|source| EnsureDatabaseError::RequestSend { source })?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::PRECONDITION_FAILED => Ok(()),
            status => Err(EnsureDatabaseError::HttpStatus { status }),
        }
    }

    pub async fn get_revision(&self, db: &str, id: &str) -> Result<Option<String>, GetRevisionError> {
        let response = self
            .http
            .get(format!("{}/{db}/{id}", self.base_url))
            .send()
            .await
            .map_err(|source| GetRevisionError::RequestSend { source })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let doc: RevisionOnly = response
                    .json()
                    .await
                    .map_err(|source| GetRevisionError::ResponseRead { source })?;
                Ok(Some(doc.rev))
            }
            status => Err(GetRevisionError::HttpStatus { status }),
        }
    }

    /// Writes `doc` under `id`, attaching the current revision when the document exists.
    pub async fn upsert(&self, db: &str, id: &str, mut doc: Value) -> Result<(), UpsertError> {
        if let Some(rev) = self.get_revision(db, id).await? {
            if let Some(fields) = doc.as_object_mut() {
                fields.insert("_rev".to_string(), Value::String(rev));
            }
        }

        let response = self
            .http
            .put(format!("{}/{db}/{id}", self.base_url))
            .json(&doc)
            .send()
            .await
            .map_err(|source| UpsertError::RequestSend { source })?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => Ok(()),
            StatusCode::CONFLICT => Err(UpsertError::Conflict { id: id.to_string() }),
            status => Err(UpsertError::HttpStatus { status }),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnsureDatabaseError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("HttpStatus: {status}")]
    HttpStatus {
        status: StatusCode,
    },
}

#[derive(Debug, Error)]
pub enum GetRevisionError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("HttpStatus: {status}")]
    HttpStatus {
        status: StatusCode,
    },
}

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("GetRevision: {source}")]
    GetRevision {
        #[from]
        source: GetRevisionError,
    },

    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("Conflict on {id}")]
    Conflict {
        id: String,
    },

    #[error("HttpStatus: {status}")]
    HttpStatus {
        status: StatusCode,
    },
}
