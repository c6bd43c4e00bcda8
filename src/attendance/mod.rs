//! Punch recording and review.
//!
//! [`PunchRecorder`] is the only writer of new punches: it validates a
//! submission against the derived attendance state, the PIN and the
//! employee's geofences, then inserts it under a per-employee lock.
//! [`review_punch`] applies manager decisions to stored punches.

mod locks;
mod recorder;
mod review;

pub use locks::EmployeeLocks;
pub use recorder::{PunchReceipt, PunchRecorder, PunchSubmission};
pub use review::{ReviewAction, review_punch};
