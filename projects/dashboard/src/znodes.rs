//! Views joining the cached znode list with DMN state and queue position.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::queue::{dmn_states, parse_outpoint, queue_position, QueueError};

const ADDRESS_FIELDS: [&str; 4] = ["payee", "owneraddress", "votingaddress", "collateraladdress"];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("ProTxList: {source}")]
    ProTxList {
        #[from]
        source: QueueError,
    },

    #[error("ZnodeListShape: expected an object keyed by outpoint")]
    ZnodeListShape,

    #[error("WinnersShape: expected an object keyed by block height")]
    WinnersShape,
}

/// Reads a cached queue; anything that is not a list of strings is treated as empty.
pub fn queue_from_value(queue: Option<&Value>) -> Vec<String> {
    queue
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Upcoming payees with their znode record, `dmnState`, `nextPaidBlock` and `queuePos`,
/// ordered by the block they will be paid in.
pub fn winners_view(
    winners: &Value,
    znodelist: &Value,
    protxlist: &Value,
    queue: &[String],
) -> Result<Vec<Value>, ViewError> {
    let winners = winners.as_object().ok_or(ViewError::WinnersShape)?;
    let znodes = znodelist.as_object().ok_or(ViewError::ZnodeListShape)?;
    let states = dmn_states(protxlist)?;

    let mut out: Vec<(i64, Value)> = Vec::with_capacity(winners.len());

    for (next_paid, payee) in winners {
        let Some(payee) = payee.as_str() else {
            warn!(%next_paid, "winner without a payee address");
            continue;
        };

        let Some((outpoint, znode)) = znodes
            .iter()
            .find(|(_, zn)| zn.get("payee").and_then(Value::as_str) == Some(payee))
        else {
            warn!(%next_paid, %payee, "winner not present in znode list");
            continue;
        };

        let mut record = as_record(znode);
        record.insert("dmnState".to_string(), dmn_state_for(znode, &states));
        record.insert("nextPaidBlock".to_string(), Value::String(next_paid.clone()));
        record.insert("queuePos".to_string(), Value::from(queue_position(queue, outpoint)));

        let height = next_paid.parse().unwrap_or(i64::MAX);
        out.push((height, Value::Object(record)));
    }

    out.sort_by_key(|(height, _)| *height);

    Ok(out.into_iter().map(|(_, record)| record).collect())
}

/// First znode with `address` as payee, owner, voting or collateral address,
/// extended with `txid`, `queue_pos` and `dmnstate`.
pub fn lookup_znode(
    address: &str,
    znodelist: &Value,
    protxlist: &Value,
    queue: &[String],
) -> Result<Option<Value>, ViewError> {
    let znodes = znodelist.as_object().ok_or(ViewError::ZnodeListShape)?;
    let states = dmn_states(protxlist)?;

    let found = znodes.iter().find(|(_, znode)| {
        ADDRESS_FIELDS
            .iter()
            .any(|field| znode.get(*field).and_then(Value::as_str) == Some(address))
    });

    let Some((outpoint, znode)) = found else {
        return Ok(None);
    };

    let txid = parse_outpoint(outpoint)
        .map(|op| Value::String(op.txid.to_string()))
        .unwrap_or(Value::Null);

    let mut record = as_record(znode);
    record.insert("txid".to_string(), txid);
    record.insert("queue_pos".to_string(), Value::from(queue_position(queue, outpoint)));
    record.insert("dmnstate".to_string(), dmn_state_for(znode, &states));

    Ok(Some(Value::Object(record)))
}

fn as_record(znode: &Value) -> Map<String, Value> {
    znode.as_object().cloned().unwrap_or_default()
}

fn dmn_state_for(znode: &Value, states: &std::collections::HashMap<&str, &Value>) -> Value {
    znode
        .get("proTxHash")
        .and_then(Value::as_str)
        .and_then(|hash| states.get(hash))
        .map(|state| (*state).clone())
        .unwrap_or(Value::Null)
}
