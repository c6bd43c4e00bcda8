//! Error types for the offline replay queue.

use thiserror::Error;

/// Errors raised on the client side of punch submission.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        /// A description of the failure.
        message: String,
    },

    /// The server answered with a non-success status while online.
    #[error("HTTP {status}: {body}")]
    Http {
        /// The response status code.
        status: u16,
        /// The response body.
        body: String,
    },

    /// The request cannot be sent as written, so resending it cannot help.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// A description of what was malformed.
        message: String,
    },

    /// The durable queue could not be read or written.
    #[error("Queue storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// A queued request or the queue file could not be (de)serialized.
    #[error("Queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another drain is in progress on this queue.
    #[error("Queue is already draining")]
    AlreadyDraining,
}

impl QueueError {
    /// Shorthand for a [`QueueError::Network`] error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Shorthand for a [`QueueError::InvalidRequest`] error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Shorthand for a [`QueueError::Storage`] error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
