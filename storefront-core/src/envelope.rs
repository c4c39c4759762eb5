//! Success and error envelopes
//!
//! Every API response wraps its payload: success bodies as
//! `{ "data": ..., "meta": ... }`, failures as
//! `{ "error": { "message": ..., "details": ... } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success wrapper around a payload of type `T`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,

    /// List endpoints attach pagination or count metadata here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    pub fn with_meta(data: T, meta: Value) -> Self {
        Self {
            data,
            meta: Some(meta),
        }
    }
}

/// Pagination metadata on paged list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

/// Count metadata on full (unpaged) list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMeta {
    pub count: u64,
}

/// Error wrapper carried on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                details: None,
            },
        }
    }
}

/// The error payload itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
