//! Error types for the attendance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition the punch recorder, the reporting layer and the
//! configuration loader can run into.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for the attendance engine.
///
/// Every server-side operation returns this error type. The HTTP layer maps
/// each variant onto a status code (see `api::ApiErrorResponse`).
///
/// # Example
///
/// ```
/// use attendance_engine::error::AttendanceError;
///
/// let error = AttendanceError::ConfigNotFound {
///     path: "/missing/roster.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/roster.yaml");
/// ```
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The request was malformed or missing a required input.
    #[error("Validation error: {message}")]
    Validation {
        /// A description of what was invalid.
        message: String,
    },

    /// A clock-in was attempted while a shift is still open.
    #[error("Already clocked in since {last_clock_in}")]
    AlreadyClockedIn {
        /// Timestamp of the open shift's clock-in.
        last_clock_in: DateTime<Utc>,
    },

    /// A clock-out was attempted without an open shift.
    #[error("Not clocked in")]
    NotClockedIn,

    /// A break punch violated the enforced break discipline.
    #[error("Break conflict: {message}")]
    BreakConflict {
        /// A description of the conflict.
        message: String,
    },

    /// A punch was timed before a punch the employee already has on record.
    #[error("Punch at {timestamp} predates the latest recorded punch at {latest_punch}")]
    OutOfOrderPunch {
        /// Event time of the rejected punch.
        timestamp: DateTime<Utc>,
        /// Event time of the employee's latest recorded punch.
        latest_punch: DateTime<Utc>,
    },

    /// The PIN supplied with a PIN punch did not match.
    #[error("Invalid PIN")]
    InvalidPin,

    /// The punch location is outside every required geofence.
    #[error("Outside geofence '{geofence_id}' by {distance_meters} meters")]
    OutsideGeofence {
        /// Distance to the nearest required geofence center, in whole meters.
        distance_meters: f64,
        /// The nearest required geofence.
        geofence_id: String,
    },

    /// The employee does not exist.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The employee id that was looked up.
        employee_id: String,
    },

    /// The punch does not exist.
    #[error("Punch not found: {punch_id}")]
    PunchNotFound {
        /// The punch id that was looked up.
        punch_id: String,
    },

    /// The store refused to record a second open shift for an employee.
    #[error("Open shift already exists for employee '{employee_id}'")]
    OpenShiftConflict {
        /// The employee with the existing open shift.
        employee_id: String,
        /// Timestamp of the existing open shift's clock-in.
        last_clock_in: DateTime<Utc>,
    },

    /// The persistence layer failed after validation passed.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the failure.
        message: String,
    },
}

impl AttendanceError {
    /// Shorthand for a [`AttendanceError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`AttendanceError::Persistence`] error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return AttendanceError.
pub type AttendanceResult<T> = Result<T, AttendanceError>;
