//! Payment queue ranking for enabled znodes.
//!
//! Each node gets a composite score: the most recent of its last paid block,
//! DMN registration height and PoSe revival height, plus its collateral txid
//! read as a fraction of the largest 256-bit value. Lower scores get paid first.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

static OUTPOINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"COutPoint\((\w+), (\d+)\)").expect("outpoint pattern is valid")
});

/// 16^64 - 1, the largest txid, accumulated the same way as `txid_fraction`.
static MAX_TXID: LazyLock<f64> = LazyLock::new(|| (0..64).fold(0.0_f64, |acc, _| acc * 16.0 + 15.0));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutPoint<'a> {
    pub txid: &'a str,
    pub index: u32,
}

pub fn parse_outpoint(outpoint: &str) -> Option<OutPoint<'_>> {
    let captures = OUTPOINT_RE.captures(outpoint)?;
    let txid = captures.get(1)?.as_str();
    let index = captures.get(2)?.as_str().parse().ok()?;
    Some(OutPoint { txid, index })
}

/// The txid as a fraction in `[0, 1]`. `None` when it is not hex.
pub fn txid_fraction(txid: &str) -> Option<f64> {
    let mut value = 0f64;
    for c in txid.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    Some(value / *MAX_TXID)
}

#[derive(Debug, Deserialize)]
struct ZnodeEntry {
    status: String,
    #[serde(rename = "proTxHash")]
    pro_tx_hash: String,
    lastpaidblock: i64,
}

#[derive(Debug, Deserialize)]
struct DmnState {
    #[serde(rename = "registeredHeight")]
    registered_height: i64,
    #[serde(rename = "PoSeRevivedHeight")]
    pose_revived_height: i64,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("ZnodeListShape: expected an object keyed by outpoint")]
    ZnodeListShape,

    #[error("ProTxListShape: expected an array of protx entries")]
    ProTxListShape,
}

/// Maps `proTxHash` to the DMN `state` object of each registered protx.
pub fn dmn_states(protxlist: &Value) -> Result<HashMap<&str, &Value>, QueueError> {
    let entries = protxlist.as_array().ok_or(QueueError::ProTxListShape)?;
    Ok(entries
        .iter()
        .filter_map(|mn| Some((mn.get("proTxHash")?.as_str()?, mn.get("state")?)))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueScore {
    pub last_paid: i64,
    pub txid_fraction: f64,
}

impl QueueScore {
    pub fn value(&self) -> f64 {
        self.last_paid as f64 + self.txid_fraction
    }
}

fn score_znode(outpoint: &str, znode: &Value, states: &HashMap<&str, &Value>) -> Option<QueueScore> {
    let entry: ZnodeEntry = match serde_json::from_value(znode.clone()) {
        Ok(entry) => entry,
        Err(err) => {
            warn!(%outpoint, %err, "skipping malformed znode entry");
            return None;
        }
    };

    if entry.status != "ENABLED" {
        return None;
    }

    let Some(state) = states.get(entry.pro_tx_hash.as_str()) else {
        warn!(%outpoint, pro_tx_hash = %entry.pro_tx_hash, "no protx entry for enabled znode");
        return None;
    };
    let state: DmnState = match serde_json::from_value((*state).clone()) {
        Ok(state) => state,
        Err(err) => {
            warn!(%outpoint, %err, "skipping znode with malformed dmn state");
            return None;
        }
    };

    let Some(fraction) = parse_outpoint(outpoint).and_then(|op| txid_fraction(op.txid)) else {
        warn!(%outpoint, "skipping znode with unparsable outpoint");
        return None;
    };

    Some(QueueScore {
        last_paid: entry
            .lastpaidblock
            .max(state.registered_height)
            .max(state.pose_revived_height),
        txid_fraction: fraction,
    })
}

/// Outpoints of enabled znodes ordered by ascending queue score.
pub fn compute_queue(znodelist: &Value, protxlist: &Value) -> Result<Vec<String>, QueueError> {
    let znodes = znodelist.as_object().ok_or(QueueError::ZnodeListShape)?;
    let states = dmn_states(protxlist)?;

    let mut scored: Vec<(&String, f64)> = znodes
        .iter()
        .filter_map(|(outpoint, znode)| {
            score_znode(outpoint, znode, &states).map(|score| (outpoint, score.value()))
        })
        .collect();

    // stable, so equal scores keep list order
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(scored.into_iter().map(|(outpoint, _)| outpoint.clone()).collect())
}

/// Zero-based position of `outpoint` in `queue`, -1 when absent.
pub fn queue_position(queue: &[String], outpoint: &str) -> i64 {
    queue
        .iter()
        .position(|q| q == outpoint)
        .and_then(|idx| i64::try_from(idx).ok())
        .unwrap_or(-1)
}
