//! Normalization of the listing endpoint's response shapes.
//!
//! The backend has answered `GET /transaction` in several shapes over time:
//!
//! - a bare array of transactions
//! - `{ "data": [...] , "pagination"? }`
//! - `{ "data": { "data": [...] }, "pagination"? }`
//! - `{ "transactions": [...], "pagination"? }`
//! - `{ "transactions": { "data": [...], "limit", "skip", "count" } }`
//!
//! The shape is detected once here; everything downstream only sees
//! [`TransactionsResponse`].

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{DEFAULT_PAGE_LIMIT, Pagination, Transaction, TransactionsResponse};

/// Recognized top-level shapes.
#[derive(Debug)]
enum ListingShape<'a> {
    Bare(&'a [Value]),
    Transactions {
        rows: &'a Value,
        envelope: &'a Map<String, Value>,
    },
    Data {
        rows: &'a Value,
        envelope: &'a Map<String, Value>,
    },
    Unrecognized,
}

impl<'a> ListingShape<'a> {
    fn detect(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => ListingShape::Bare(items),
            Value::Object(envelope) => {
                // `transactions` wins when both keys are present.
                if let Some(rows) = envelope.get("transactions") {
                    ListingShape::Transactions { rows, envelope }
                } else if let Some(rows) = envelope.get("data") {
                    ListingShape::Data { rows, envelope }
                } else {
                    ListingShape::Unrecognized
                }
            }
            _ => ListingShape::Unrecognized,
        }
    }
}

/// Maps any listing payload to the canonical shape. Never fails: an
/// unrecognized payload yields an empty page without pagination.
pub fn normalize(raw: &Value) -> TransactionsResponse {
    match ListingShape::detect(raw) {
        ListingShape::Bare(items) => TransactionsResponse {
            data: decode_rows(items),
            pagination: None,
        },
        ListingShape::Transactions { rows, envelope } | ListingShape::Data { rows, envelope } => {
            TransactionsResponse {
                data: extract_rows(rows),
                pagination: extract_pagination(envelope),
            }
        }
        ListingShape::Unrecognized => {
            warn!("Unrecognized transaction listing payload, treating as empty");
            TransactionsResponse::default()
        }
    }
}

/// Rows are either an array or an object wrapping one under `data`.
fn extract_rows(rows: &Value) -> Vec<Transaction> {
    match rows {
        Value::Array(items) => decode_rows(items),
        Value::Object(inner) => match inner.get("data") {
            Some(Value::Array(items)) => decode_rows(items),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn decode_rows(items: &[Value]) -> Vec<Transaction> {
    items
        .iter()
        .filter_map(|item| match Transaction::deserialize(item) {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!("Skipping malformed transaction row: {}", e);
                None
            }
        })
        .collect()
}

/// Prefers an explicit `pagination` object, else synthesizes one from
/// `transactions.{skip,limit,count}`.
fn extract_pagination(envelope: &Map<String, Value>) -> Option<Pagination> {
    if let Some(Value::Object(explicit)) = envelope.get("pagination") {
        return Some(explicit_pagination(explicit));
    }

    match envelope.get("transactions") {
        Some(Value::Object(nested)) => synthesized_pagination(nested),
        _ => None,
    }
}

/// Always kept. A missing or non-numeric `skip`/`limit` falls back to the
/// first default page; `count` is read on its own.
fn explicit_pagination(fields: &Map<String, Value>) -> Pagination {
    Pagination {
        skip: fields.get("skip").and_then(Value::as_u64).unwrap_or(0),
        limit: fields
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_PAGE_LIMIT),
        count: fields.get("count").and_then(Value::as_u64),
    }
}

/// Requires numeric `skip` and `limit`; a non-numeric `count` is dropped.
fn synthesized_pagination(fields: &Map<String, Value>) -> Option<Pagination> {
    let skip = fields.get("skip").and_then(Value::as_u64)?;
    let limit = fields.get("limit").and_then(Value::as_u64)?;
    let count = fields.get("count").and_then(Value::as_u64);
    Some(Pagination { skip, limit, count })
}
