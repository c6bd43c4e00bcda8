//! Manager review of recorded punches.
//!
//! Review never deletes a punch. Approval and rejection append an audit
//! marker to the notes; an edit may correct the timestamp and append the
//! editor's note.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::PunchRecord;
use crate::store::AttendanceStore;

/// A review decision on one punch.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewAction {
    /// Mark the punch as approved.
    Approve,
    /// Mark the punch as rejected; a reason is required.
    Reject {
        /// Why the punch was rejected.
        reason: String,
    },
    /// Correct the timestamp and/or annotate the punch.
    Edit {
        /// Replacement event time.
        new_timestamp: Option<DateTime<Utc>>,
        /// Note appended as `[EDITED: ...]`.
        notes: Option<String>,
    },
}

impl ReviewAction {
    /// Builds an action from its wire name and optional fields.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceError::Validation`] for an unknown action or a
    /// rejection without a reason.
    pub fn parse(
        action: &str,
        reason: Option<String>,
        new_timestamp: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> AttendanceResult<Self> {
        match action {
            "approve" => Ok(ReviewAction::Approve),
            "reject" => match reason.filter(|r| !r.trim().is_empty()) {
                Some(reason) => Ok(ReviewAction::Reject { reason }),
                None => Err(AttendanceError::validation(
                    "Reason is required for rejection",
                )),
            },
            "edit" => Ok(ReviewAction::Edit {
                new_timestamp,
                notes,
            }),
            other => Err(AttendanceError::validation(format!(
                "Invalid action: {}",
                other
            ))),
        }
    }

    /// Returns the confirmation message for this action.
    pub fn message(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "Punch approved",
            ReviewAction::Reject { .. } => "Punch rejected",
            ReviewAction::Edit { .. } => "Punch updated",
        }
    }

    fn apply(&self, punch: &mut PunchRecord) {
        match self {
            ReviewAction::Approve => punch.append_note("[APPROVED]"),
            ReviewAction::Reject { reason } => {
                punch.append_note(&format!("[REJECTED: {}]", reason))
            }
            ReviewAction::Edit {
                new_timestamp,
                notes,
            } => {
                if let Some(timestamp) = new_timestamp {
                    punch.timestamp = *timestamp;
                }
                if let Some(notes) = notes {
                    punch.append_note(&format!("[EDITED: {}]", notes));
                }
            }
        }
    }
}

/// Applies a review action to a stored punch and returns the updated punch.
///
/// # Errors
///
/// Returns [`AttendanceError::PunchNotFound`] for an unknown punch.
pub async fn review_punch(
    store: &dyn AttendanceStore,
    punch_id: Uuid,
    action: &ReviewAction,
) -> AttendanceResult<PunchRecord> {
    let mut punch = store
        .punch(punch_id)
        .await?
        .ok_or_else(|| AttendanceError::PunchNotFound {
            punch_id: punch_id.to_string(),
        })?;

    action.apply(&mut punch);
    store.update_punch(punch.clone()).await?;

    info!(punch_id = %punch_id, action = action.message(), "Punch reviewed");
    Ok(punch)
}
