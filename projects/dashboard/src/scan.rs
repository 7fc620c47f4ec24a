//! One-shot export of `znode list full` into CouchDB.

use interfaces_couchdb_documents::index::{CouchClient, EnsureDatabaseError, UpsertError};
use interfaces_zcoin_rpc::index::{CallError, ZcoinRpcClient};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const DATABASE: &str = "znodes";

/// One line of `znode list full`:
/// `status protocol payee lastseen activeseconds lastpaidtime lastpaidblock ip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZnodeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: String,
    pub protocol: String,
    pub payee: String,
    pub lastseen: i64,
    pub activeseconds: i64,
    pub lastpaidtime: i64,
    pub lastpaidblock: i64,
    pub ip: String,
}

#[derive(Debug, Error)]
pub enum ParseZnodeError {
    #[error("MissingField: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("InvalidInteger: {field} = {value}")]
    InvalidInteger {
        field: &'static str,
        value: String,
    },
}

pub fn parse_znode_line(id: &str, line: &str) -> Result<ZnodeDocument, ParseZnodeError> {
    let mut parts = line.split_whitespace();

    let mut text = |field: &'static str| {
        parts
            .next()
            .map(str::to_string)
            .ok_or(ParseZnodeError::MissingField { field })
    };

    let status = text("status")?;
    let protocol = text("protocol")?;
    let payee = text("payee")?;
    let lastseen = text("lastseen")?;
    let activeseconds = text("activeseconds")?;
    let lastpaidtime = text("lastpaidtime")?;
    let lastpaidblock = text("lastpaidblock")?;
    let ip = text("ip")?;

    Ok(ZnodeDocument {
        id: id.to_string(),
        status,
        protocol,
        payee,
        lastseen: integer("lastseen", lastseen)?,
        activeseconds: integer("activeseconds", activeseconds)?,
        lastpaidtime: integer("lastpaidtime", lastpaidtime)?,
        lastpaidblock: integer("lastpaidblock", lastpaidblock)?,
        ip,
    })
}

fn integer(field: &'static str, value: String) -> Result<i64, ParseZnodeError> {
    value
        .parse()
        .map_err(|_| ParseZnodeError::InvalidInteger { field, value })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub saved: usize,
    pub conflicts: usize,
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("ListZnodes: {source}")]
    ListZnodes {
        #[from]
        source: CallError,
    },

    #[error("UnexpectedListShape")]
    UnexpectedListShape,

    #[error("EnsureDatabase: {source}")]
    EnsureDatabase {
        #[from]
        source: EnsureDatabaseError,
    },

    #[error("SerializeDocument: {source}")]
    SerializeDocument {
        #[from]
        source: serde_json::Error,
    },

    #[error("Upsert: {source}")]
    Upsert {
        #[from]
        source: UpsertError,
    },
}

pub async fn scan_znodes(rpc: &ZcoinRpcClient, couch: &CouchClient) -> Result<ScanSummary, ScanError> {
    couch.ensure_database(DATABASE).await?;

    let znodes = rpc.call("znode", &[json!("list"), json!("full")]).await?;
    let Value::Object(znodes) = znodes else {
        return Err(ScanError::UnexpectedListShape);
    };

    let mut summary = ScanSummary::default();

    for (key, line) in &znodes {
        let doc = match line.as_str().map(|line| parse_znode_line(key, line)) {
            Some(Ok(doc)) => doc,
            Some(Err(err)) => {
                warn!(%key, %err, "skipping unparsable znode line");
                summary.skipped += 1;
                continue;
            }
            None => {
                warn!(%key, "skipping non-string znode entry");
                summary.skipped += 1;
                continue;
            }
        };

        match couch.upsert(DATABASE, key, serde_json::to_value(&doc)?).await {
            Ok(()) => summary.saved += 1,
            Err(UpsertError::Conflict { id }) => {
                warn!("Warning: conflict on {id}");
                summary.conflicts += 1;
            }
            Err(source) => return Err(ScanError::Upsert { source }),
        }
    }

    info!(
        saved = summary.saved,
        conflicts = summary.conflicts,
        skipped = summary.skipped,
        "znode scan finished"
    );

    Ok(summary)
}
