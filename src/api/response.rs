//! Response types for the attendance API.
//!
//! This module defines the success envelopes and the error body shared by
//! every endpoint, plus the mapping from [`AttendanceError`] onto HTTP
//! status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::AttendanceError;
use crate::models::PunchRecord;

/// Body of `POST /attendance/punch` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchResponse {
    /// Always true.
    pub success: bool,
    /// The stored punch.
    pub punch: PunchRecord,
    /// Shift length in whole minutes, for clock-outs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_duration: Option<i64>,
    /// Human-readable confirmation.
    pub message: String,
    /// True when an earlier submission with the same idempotency key was returned.
    pub replayed: bool,
}

/// Body of `POST /attendance/review` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// Always true.
    pub success: bool,
    /// The punch after review.
    pub punch: PunchRecord,
    /// Human-readable confirmation.
    pub message: String,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Short human-readable error, e.g. "Not clocked in".
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
    /// Longer explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Distance to the nearest required geofence, in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// The nearest required geofence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_id: Option<String>,
    /// Set on geofence violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Clock-in time of the open shift on a duplicate clock-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_clock_in: Option<DateTime<Utc>>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            message: None,
            distance: None,
            geofence_id: None,
            required: None,
            last_clock_in: None,
        }
    }

    /// Creates a new API error with an explanation.
    pub fn with_message(
        code: impl Into<String>,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(code, error)
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(error: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", error)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::with_message("MALFORMED_JSON", "Invalid request body", message)
    }

    /// Creates a malformed query string error response.
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::with_message("INVALID_QUERY", "Invalid query parameters", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<AttendanceError> for ApiErrorResponse {
    fn from(error: AttendanceError) -> Self {
        match error {
            AttendanceError::ConfigNotFound { .. } | AttendanceError::ConfigParseError { .. } => {
                error!(error = %error, "Configuration error while serving request");
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_message(
                        "CONFIG_ERROR",
                        "Configuration error",
                        error.to_string(),
                    ),
                }
            }
            AttendanceError::Validation { message } => {
                ApiErrorResponse::bad_request(ApiError::validation_error(message))
            }
            AttendanceError::AlreadyClockedIn { last_clock_in }
            | AttendanceError::OpenShiftConflict { last_clock_in, .. } => {
                ApiErrorResponse::bad_request(ApiError {
                    last_clock_in: Some(last_clock_in),
                    ..ApiError::new("ALREADY_CLOCKED_IN", "Already clocked in")
                })
            }
            AttendanceError::NotClockedIn => ApiErrorResponse::bad_request(ApiError::new(
                "NOT_CLOCKED_IN",
                "Not clocked in",
            )),
            AttendanceError::BreakConflict { message } => ApiErrorResponse::bad_request(
                ApiError::with_message("BREAK_CONFLICT", "Break conflict", message),
            ),
            AttendanceError::OutOfOrderPunch {
                timestamp,
                latest_punch,
            } => ApiErrorResponse::bad_request(ApiError::with_message(
                "OUT_OF_ORDER_PUNCH",
                "Punch predates latest recorded punch",
                format!(
                    "Punch at {} is earlier than the latest recorded punch at {}",
                    timestamp.to_rfc3339(),
                    latest_punch.to_rfc3339()
                ),
            )),
            AttendanceError::InvalidPin => ApiErrorResponse {
                status: StatusCode::UNAUTHORIZED,
                error: ApiError::new("INVALID_PIN", "Invalid PIN"),
            },
            AttendanceError::OutsideGeofence {
                distance_meters,
                geofence_id,
            } => ApiErrorResponse {
                status: StatusCode::FORBIDDEN,
                error: ApiError {
                    distance: Some(distance_meters),
                    geofence_id: Some(geofence_id),
                    required: Some(true),
                    ..ApiError::with_message(
                        "OUTSIDE_GEOFENCE",
                        "Outside geofence",
                        format!("You are {}m from the required location", distance_meters),
                    )
                },
            },
            AttendanceError::EmployeeNotFound { employee_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::with_message(
                    "EMPLOYEE_NOT_FOUND",
                    "Employee not found",
                    format!("No employee with id '{}'", employee_id),
                ),
            },
            AttendanceError::PunchNotFound { punch_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::with_message(
                    "PUNCH_NOT_FOUND",
                    "Punch not found",
                    format!("No punch with id '{}'", punch_id),
                ),
            },
            AttendanceError::Persistence { message } => {
                error!(error = %message, "Persistence failure");
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::new("PERSISTENCE_ERROR", "Failed to record punch"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_api_error_skips_empty_fields() {
        let error = ApiError::new("NOT_CLOCKED_IN", "Not clocked in");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"error\":\"Not clocked in\""));
        assert!(json.contains("\"code\":\"NOT_CLOCKED_IN\""));
        assert!(!json.contains("message"));
        assert!(!json.contains("geofenceId"));
    }

    #[test]
    fn test_outside_geofence_maps_to_403_with_details() {
        let response: ApiErrorResponse = AttendanceError::OutsideGeofence {
            distance_meters: 1210.0,
            geofence_id: "gf_main".to_string(),
        }
        .into();

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        let json = serde_json::to_value(&response.error).unwrap();
        assert_eq!(json["error"], "Outside geofence");
        assert_eq!(json["distance"], 1210.0);
        assert_eq!(json["geofenceId"], "gf_main");
        assert_eq!(json["required"], true);
    }

    #[test]
    fn test_open_shift_conflict_reports_last_clock_in() {
        let last = Utc.with_ymd_and_hms(2026, 1, 13, 9, 0, 0).unwrap();
        let response: ApiErrorResponse = AttendanceError::OpenShiftConflict {
            employee_id: "emp_001".to_string(),
            last_clock_in: last,
        }
        .into();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.error, "Already clocked in");
        assert_eq!(response.error.last_clock_in, Some(last));
    }

    #[test]
    fn test_out_of_order_punch_is_bad_request() {
        let latest = Utc.with_ymd_and_hms(2026, 1, 13, 17, 0, 0).unwrap();
        let response: ApiErrorResponse = AttendanceError::OutOfOrderPunch {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 13, 12, 0, 0).unwrap(),
            latest_punch: latest,
        }
        .into();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "OUT_OF_ORDER_PUNCH");
        assert!(response.error.message.unwrap().contains("2026-01-13T17:00:00"));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AttendanceError::NotClockedIn, StatusCode::BAD_REQUEST),
            (AttendanceError::InvalidPin, StatusCode::UNAUTHORIZED),
            (
                AttendanceError::PunchNotFound {
                    punch_id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                AttendanceError::persistence("disk full"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            let response: ApiErrorResponse = error.into();
            assert_eq!(response.status, status);
        }
    }
}
