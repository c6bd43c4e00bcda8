//! Client-side offline replay queue.
//!
//! Devices route punch submissions through an [`OfflineQueue`]. When the
//! device is offline or the network fails, the request is persisted by a
//! [`QueueStorage`] and replayed later by [`OfflineQueue::drain`]. Pair it
//! with an idempotency key on every punch so a replay of a request whose
//! response was lost does not record the punch twice.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use attendance_engine::offline::{HttpTransport, JsonFileStorage, OfflineQueue, OutgoingRequest};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), attendance_engine::offline::QueueError> {
//! let queue = OfflineQueue::new(
//!     Arc::new(JsonFileStorage::new("./punch-queue.json")),
//!     Arc::new(HttpTransport::new(Duration::from_secs(10))?),
//! );
//! let punch = json!({"employeeId": "emp_001", "type": "CLOCK_IN", "idempotencyKey": "7f3c"});
//! queue
//!     .submit(OutgoingRequest::post_json("http://localhost:8080/attendance/punch", &punch, "Clock in")?)
//!     .await?;
//! let summary = queue.drain().await?;
//! println!("{} resolved, {} pending", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

mod error;
mod queue;
mod request;
mod storage;
mod transport;

pub use error::{QueueError, QueueResult};
pub use queue::{DrainSummary, OfflineQueue, SubmitOutcome};
pub use request::{OutgoingRequest, QueuedRequest};
pub use storage::{JsonFileStorage, MemoryQueueStorage, QueueStorage};
pub use transport::{HttpTransport, Transport, TransportResponse};
