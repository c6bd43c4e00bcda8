//! The offline replay queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{QueueError, QueueResult};
use super::request::{OutgoingRequest, QueuedRequest};
use super::storage::QueueStorage;
use super::transport::{Transport, TransportResponse};

/// Result of [`OfflineQueue::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server answered with 2xx.
    Delivered(TransportResponse),
    /// The request was stored for a later drain.
    Queued {
        /// Id of the queued item.
        id: String,
    },
}

/// Counts from one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Items resolved and removed: delivered (2xx) or discarded as terminal
    /// (4xx or unsendable).
    pub succeeded: usize,
    /// Items kept for a later drain.
    pub failed: usize,
}

/// Wraps mutating calls so connectivity loss queues them instead of failing.
///
/// While offline, or when a send fails at the network level, the request
/// is persisted and the caller gets [`SubmitOutcome::Queued`]. [`drain`]
/// replays the queue in enqueue order.
///
/// [`drain`]: OfflineQueue::drain
pub struct OfflineQueue {
    storage: Arc<dyn QueueStorage>,
    transport: Arc<dyn Transport>,
    online: AtomicBool,
    draining: Mutex<()>,
}

impl OfflineQueue {
    /// Creates a queue that starts online.
    pub fn new(storage: Arc<dyn QueueStorage>, transport: Arc<dyn Transport>) -> Self {
        Self {
            storage,
            transport,
            online: AtomicBool::new(true),
            draining: Mutex::new(()),
        }
    }

    /// Records the device's connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns the last recorded connectivity.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Sends `request`, queueing it if the device is offline or the network fails.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Http`] if the server answered with a non-2xx status
    /// - [`QueueError::InvalidRequest`] if the request cannot be sent as written
    /// - [`QueueError::Storage`] or [`QueueError::Serialization`] if queueing failed
    pub async fn submit(&self, request: OutgoingRequest) -> QueueResult<SubmitOutcome> {
        if !self.is_online() {
            let id = self.enqueue(request).await?;
            return Ok(SubmitOutcome::Queued { id });
        }

        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => Ok(SubmitOutcome::Delivered(response)),
            Ok(response) => Err(QueueError::Http {
                status: response.status,
                body: response.body,
            }),
            Err(QueueError::Network { message }) => {
                warn!(url = %request.url, error = %message, "Network failure, queueing request");
                let id = self.enqueue(request).await?;
                Ok(SubmitOutcome::Queued { id })
            }
            Err(other) => Err(other),
        }
    }

    /// Persists `request` for a later drain and returns its id.
    pub async fn enqueue(&self, request: OutgoingRequest) -> QueueResult<String> {
        let item = QueuedRequest::new(request, Utc::now());
        let id = item.id.clone();
        info!(id = %id, label = %item.label, "Request queued");
        self.storage.push(item).await?;
        Ok(id)
    }

    /// Replays every queued item in enqueue order.
    ///
    /// 2xx and 4xx responses remove the item, as does a request that cannot
    /// be sent at all; 5xx and network failures keep it with one more retry. Items removed by the user before their turn
    /// are skipped, and items enqueued meanwhile stay queued.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AlreadyDraining`] without sending anything if
    /// another drain is running.
    pub async fn drain(&self) -> QueueResult<DrainSummary> {
        let Ok(_guard) = self.draining.try_lock() else {
            debug!("Drain already in progress");
            return Err(QueueError::AlreadyDraining);
        };

        let snapshot = self.storage.load().await?;
        let mut summary = DrainSummary::default();
        if snapshot.is_empty() {
            return Ok(summary);
        }

        for item in snapshot {
            // Cancelled by the user since the snapshot
            if !self.storage.load().await?.iter().any(|i| i.id == item.id) {
                continue;
            }

            match self.transport.send(&item.to_outgoing()).await {
                Ok(response) if response.is_success() => {
                    self.storage.remove(&item.id).await?;
                    summary.succeeded += 1;
                }
                Ok(response) if response.is_client_error() => {
                    warn!(
                        id = %item.id,
                        label = %item.label,
                        status = response.status,
                        "Discarding rejected request"
                    );
                    self.storage.remove(&item.id).await?;
                    summary.succeeded += 1;
                }
                Err(QueueError::InvalidRequest { message }) => {
                    warn!(
                        id = %item.id,
                        label = %item.label,
                        error = %message,
                        "Discarding unsendable request"
                    );
                    self.storage.remove(&item.id).await?;
                    summary.succeeded += 1;
                }
                outcome => {
                    let reason = match outcome {
                        Ok(response) => format!("HTTP {}", response.status),
                        Err(e) => e.to_string(),
                    };
                    debug!(id = %item.id, retries = item.retries + 1, reason = %reason, "Keeping request");
                    let retries = item.retries + 1;
                    self.storage
                        .replace(QueuedRequest { retries, ..item })
                        .await?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Queue drained"
        );
        Ok(summary)
    }

    /// Number of queued items.
    pub async fn count(&self) -> QueueResult<usize> {
        Ok(self.storage.load().await?.len())
    }

    /// Every queued item, oldest first.
    pub async fn get_all(&self) -> QueueResult<Vec<QueuedRequest>> {
        self.storage.load().await
    }

    /// Cancels a queued item. Returns false if it was not queued.
    pub async fn remove(&self, id: &str) -> QueueResult<bool> {
        self.storage.remove(id).await
    }

    /// Drops every queued item.
    pub async fn clear(&self) -> QueueResult<()> {
        self.storage.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use crate::offline::MemoryQueueStorage;

    /// Answers with scripted results and records what was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        script: std::sync::Mutex<VecDeque<QueueResult<u16>>>,
        sent: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn with(script: Vec<QueueResult<u16>>) -> Arc<Self> {
            Arc::new(Self {
                script: std::sync::Mutex::new(script.into()),
                sent: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &OutgoingRequest) -> QueueResult<TransportResponse> {
            self.sent.lock().unwrap().push(request.label.clone());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(200));
            next.map(|status| TransportResponse {
                status,
                body: String::new(),
            })
        }
    }

    fn request(label: &str) -> OutgoingRequest {
        OutgoingRequest::post_json("http://localhost/attendance/punch", &label, label).unwrap()
    }

    fn queue(transport: Arc<ScriptedTransport>) -> OfflineQueue {
        OfflineQueue::new(Arc::new(MemoryQueueStorage::new()), transport)
    }

    #[tokio::test]
    async fn test_offline_submit_is_queued_without_sending() {
        let transport = ScriptedTransport::with(vec![]);
        let queue = queue(transport.clone());
        queue.set_online(false);

        let outcome = queue.submit(request("Clock in")).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued { .. }));
        assert!(transport.sent().is_empty());
        assert_eq!(queue.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_is_queued() {
        let transport = ScriptedTransport::with(vec![Err(QueueError::network("reset"))]);
        let queue = queue(transport);

        let outcome = queue.submit(request("Clock in")).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued { .. }));
        assert_eq!(queue.get_all().await.unwrap()[0].retries, 0);
    }

    #[tokio::test]
    async fn test_http_failure_passes_through() {
        let transport = ScriptedTransport::with(vec![Ok(400), Ok(503)]);
        let queue = queue(transport);

        assert!(matches!(
            queue.submit(request("a")).await,
            Err(QueueError::Http { status: 400, .. })
        ));
        assert!(matches!(
            queue.submit(request("b")).await,
            Err(QueueError::Http { status: 503, .. })
        ));
        assert_eq!(queue.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_classifies_responses() {
        let transport = ScriptedTransport::with(vec![
            Ok(201),
            Ok(503),
            Ok(409),
            Err(QueueError::network("offline")),
        ]);
        let queue = queue(transport.clone());
        queue.set_online(false);
        for label in ["one", "two", "three", "four"] {
            queue.submit(request(label)).await.unwrap();
        }

        let summary = queue.drain().await.unwrap();
        assert_eq!(summary, DrainSummary { succeeded: 2, failed: 2 });
        assert_eq!(transport.sent(), vec!["one", "two", "three", "four"]);

        let remaining = queue.get_all().await.unwrap();
        let labels: Vec<_> = remaining.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["two", "four"]);
        assert!(remaining.iter().all(|i| i.retries == 1));
    }

    #[tokio::test]
    async fn test_unsendable_request_is_not_queued_or_retried() {
        let transport = ScriptedTransport::with(vec![
            Err(QueueError::invalid_request("invalid method")),
            Err(QueueError::invalid_request("invalid method")),
            Ok(201),
        ]);
        let queue = queue(transport.clone());

        assert!(matches!(
            queue.submit(request("online")).await,
            Err(QueueError::InvalidRequest { .. })
        ));
        assert_eq!(queue.count().await.unwrap(), 0);

        queue.set_online(false);
        queue.submit(request("bad")).await.unwrap();
        queue.submit(request("good")).await.unwrap();
        queue.set_online(true);

        let summary = queue.drain().await.unwrap();
        assert_eq!(summary, DrainSummary { succeeded: 2, failed: 0 });
        assert_eq!(queue.count().await.unwrap(), 0);
        assert_eq!(transport.sent(), vec!["online", "bad", "good"]);
    }

    #[tokio::test]
    async fn test_remove_before_drain_cancels_item() {
        let transport = ScriptedTransport::with(vec![]);
        let queue = queue(transport.clone());
        queue.set_online(false);
        let SubmitOutcome::Queued { id } = queue.submit(request("cancel me")).await.unwrap() else {
            panic!("expected queued");
        };
        queue.submit(request("keep")).await.unwrap();

        assert!(queue.remove(&id).await.unwrap());
        queue.drain().await.unwrap();
        assert_eq!(transport.sent(), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_empty_drain_and_clear() {
        let queue = queue(ScriptedTransport::with(vec![]));
        assert_eq!(queue.drain().await.unwrap(), DrainSummary::default());

        queue.set_online(false);
        queue.submit(request("a")).await.unwrap();
        queue.clear().await.unwrap();
        assert_eq!(queue.count().await.unwrap(), 0);
    }
}
