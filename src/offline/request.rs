//! Outgoing and queued request types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::QueueResult;

/// A mutating API call as issued by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingRequest {
    /// Absolute URL.
    pub url: String,
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Serialized JSON body.
    pub body: Option<String>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Human-readable label for display, e.g. "Clock in".
    pub label: String,
}

impl OutgoingRequest {
    /// Builds a `POST` with a JSON body.
    pub fn post_json<T: Serialize>(
        url: impl Into<String>,
        body: &T,
        label: impl Into<String>,
    ) -> QueueResult<Self> {
        Ok(Self {
            url: url.into(),
            method: "POST".to_string(),
            body: Some(serde_json::to_string(body)?),
            headers: BTreeMap::new(),
            label: label.into(),
        })
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A request persisted for later replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// Queue-local id, `oq_` followed by a UUID.
    pub id: String,
    /// Absolute URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Serialized JSON body.
    pub body: Option<String>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Human-readable label.
    pub label: String,
    /// When the request was queued.
    pub timestamp: DateTime<Utc>,
    /// Failed replay attempts so far.
    pub retries: u32,
}

impl QueuedRequest {
    /// Wraps `request` with a fresh id and zero retries.
    pub fn new(request: OutgoingRequest, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("oq_{}", Uuid::new_v4().simple()),
            url: request.url,
            method: request.method,
            body: request.body,
            headers: request.headers,
            label: request.label,
            timestamp,
            retries: 0,
        }
    }

    /// Returns the request to send on replay.
    pub fn to_outgoing(&self) -> OutgoingRequest {
        OutgoingRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            headers: self.headers.clone(),
            label: self.label.clone(),
        }
    }
}
