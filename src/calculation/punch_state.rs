//! Attendance state machine.
//!
//! The state of an employee is never stored. It is derived from the punch
//! history by [`derive_state`] and every new punch is checked against it by
//! [`validate_transition`] before anything is persisted.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{PunchRecord, PunchType};

/// The derived attendance state of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    /// No open shift.
    Out,
    /// A shift is open.
    In {
        /// Timestamp of the open clock-in.
        clock_in: DateTime<Utc>,
    },
    /// A shift is open and a break is in progress.
    OnBreak {
        /// Timestamp of the open clock-in.
        clock_in: DateTime<Utc>,
        /// Timestamp of the open break start.
        break_start: DateTime<Utc>,
    },
}

impl AttendanceState {
    /// Returns the clock-in of the open shift, if any.
    pub fn open_clock_in(&self) -> Option<DateTime<Utc>> {
        match self {
            AttendanceState::Out => None,
            AttendanceState::In { clock_in } | AttendanceState::OnBreak { clock_in, .. } => {
                Some(*clock_in)
            }
        }
    }

    /// Returns the status code used by the HTTP layer.
    pub fn status_code(&self) -> &'static str {
        match self {
            AttendanceState::Out => "CLOCKED_OUT",
            AttendanceState::In { .. } => "CLOCKED_IN",
            AttendanceState::OnBreak { .. } => "ON_BREAK",
        }
    }
}

/// How break punches are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakPolicy {
    /// Break punches are recorded unconditionally.
    #[default]
    Advisory,
    /// BREAK_START requires an open shift and BREAK_END an open break.
    Enforced,
}

/// Orders punches by timestamp, breaking ties by server receipt time.
pub fn chronological_order(a: &PunchRecord, b: &PunchRecord) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then(a.created_at.cmp(&b.created_at))
}

/// Sorts punches in [`chronological_order`].
pub fn sort_chronologically(punches: &mut [PunchRecord]) {
    punches.sort_by(chronological_order);
}

/// Derives the current state from a punch history in any order.
///
/// A CLOCK_IN opens a shift regardless of its age and a later CLOCK_OUT
/// closes it. Break punches only move the state when they pair up with the
/// current state; unpaired ones are ignored.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{derive_state, AttendanceState};
/// use attendance_engine::models::{PunchRecord, PunchType};
/// use chrono::{TimeZone, Utc};
///
/// let nine = Utc.with_ymd_and_hms(2026, 1, 13, 9, 0, 0).unwrap();
/// let punches = vec![PunchRecord::new("emp_001", PunchType::ClockIn, nine, nine)];
///
/// assert_eq!(derive_state(&punches), AttendanceState::In { clock_in: nine });
/// assert_eq!(derive_state(&[]), AttendanceState::Out);
/// ```
pub fn derive_state(punches: &[PunchRecord]) -> AttendanceState {
    let mut ordered: Vec<&PunchRecord> = punches.iter().collect();
    ordered.sort_by(|a, b| chronological_order(a, b));

    ordered
        .into_iter()
        .fold(AttendanceState::Out, |state, punch| {
            match (punch.punch_type, state) {
                (PunchType::ClockIn, _) => AttendanceState::In {
                    clock_in: punch.timestamp,
                },
                (PunchType::ClockOut, _) => AttendanceState::Out,
                (PunchType::BreakStart, AttendanceState::In { clock_in }) => {
                    AttendanceState::OnBreak {
                        clock_in,
                        break_start: punch.timestamp,
                    }
                }
                (PunchType::BreakEnd, AttendanceState::OnBreak { clock_in, .. }) => {
                    AttendanceState::In { clock_in }
                }
                (_, unchanged) => unchanged,
            }
        })
}

/// Checks whether a punch of `punch_type` at `timestamp` is legal in `state`.
///
/// # Errors
///
/// - [`AttendanceError::AlreadyClockedIn`] for a CLOCK_IN while a shift is open
/// - [`AttendanceError::NotClockedIn`] for a CLOCK_OUT without an open shift
///   or while a break is open, under either break policy
/// - [`AttendanceError::Validation`] for a CLOCK_OUT earlier than its clock-in
/// - [`AttendanceError::BreakConflict`] for unpaired break punches under
///   [`BreakPolicy::Enforced`]
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{validate_transition, AttendanceState, BreakPolicy};
/// use attendance_engine::error::AttendanceError;
/// use attendance_engine::models::PunchType;
/// use chrono::Utc;
///
/// let result = validate_transition(
///     AttendanceState::Out,
///     PunchType::ClockOut,
///     Utc::now(),
///     BreakPolicy::Advisory,
/// );
/// assert!(matches!(result, Err(AttendanceError::NotClockedIn)));
/// ```
pub fn validate_transition(
    state: AttendanceState,
    punch_type: PunchType,
    timestamp: DateTime<Utc>,
    policy: BreakPolicy,
) -> AttendanceResult<()> {
    match (punch_type, state) {
        (PunchType::ClockIn, AttendanceState::Out) => Ok(()),
        (PunchType::ClockIn, open) => Err(AttendanceError::AlreadyClockedIn {
            last_clock_in: open.open_clock_in().unwrap_or(timestamp),
        }),
        (PunchType::ClockOut, AttendanceState::Out | AttendanceState::OnBreak { .. }) => {
            Err(AttendanceError::NotClockedIn)
        }
        (PunchType::ClockOut, AttendanceState::In { clock_in }) if timestamp < clock_in => {
            Err(AttendanceError::validation(format!(
                "Clock-out time {} is before clock-in time {}",
                timestamp, clock_in
            )))
        }
        (PunchType::ClockOut, AttendanceState::In { .. }) => Ok(()),
        (_, _) if policy == BreakPolicy::Advisory => Ok(()),
        (PunchType::BreakStart, AttendanceState::In { .. }) => Ok(()),
        (PunchType::BreakStart, AttendanceState::Out) => Err(AttendanceError::BreakConflict {
            message: "Cannot start a break while clocked out".to_string(),
        }),
        (PunchType::BreakStart, AttendanceState::OnBreak { .. }) => {
            Err(AttendanceError::BreakConflict {
                message: "Break already in progress".to_string(),
            })
        }
        (PunchType::BreakEnd, AttendanceState::OnBreak { break_start, .. }) => {
            if timestamp < break_start {
                Err(AttendanceError::validation(
                    "Break end is before break start",
                ))
            } else {
                Ok(())
            }
        }
        (PunchType::BreakEnd, _) => Err(AttendanceError::BreakConflict {
            message: "No break in progress".to_string(),
        }),
    }
}
