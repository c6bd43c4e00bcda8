//! Delivery of requests to the attendance server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::error::{QueueError, QueueResult};
use super::request::OutgoingRequest;

/// An HTTP response as seen by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl TransportResponse {
    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 4xx.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Sends requests to the server.
///
/// Implementations return [`QueueError::Network`] when no response was
/// received and [`QueueError::InvalidRequest`] when the request could not
/// be built; any received response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request.
    async fn send(&self, request: &OutgoingRequest) -> QueueResult<TransportResponse>;
}

/// Transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> QueueResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueueError::network(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutgoingRequest) -> QueueResult<TransportResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| {
                QueueError::invalid_request(format!("invalid method {}: {}", request.method, e))
            })?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                QueueError::invalid_request(e.to_string())
            } else {
                QueueError::network(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| QueueError::network(e.to_string()))?;

        debug!(url = %request.url, status, "Request delivered");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        let response = |status| TransportResponse {
            status,
            body: String::new(),
        };
        assert!(response(201).is_success());
        assert!(!response(404).is_success());
        assert!(response(404).is_client_error());
        assert!(!response(503).is_client_error());
    }

    #[tokio::test]
    async fn test_unparsable_method_is_not_retryable() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let mut request =
            OutgoingRequest::post_json("http://127.0.0.1:9/attendance/punch", &"{}", "x").unwrap();
        request.method = "CLOCK IN".to_string();

        assert!(matches!(
            transport.send(&request).await,
            Err(QueueError::InvalidRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let request = OutgoingRequest::post_json("http://127.0.0.1:9/attendance/punch", &"{}", "x")
            .unwrap();

        assert!(matches!(
            transport.send(&request).await,
            Err(QueueError::Network { .. })
        ));
    }
}
