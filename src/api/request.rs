//! Request types for the attendance API.
//!
//! JSON bodies and query strings use camelCase. Required fields are
//! modelled as `Option` so a missing value produces the endpoint's own
//! validation message rather than a deserializer error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendance::PunchSubmission;
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{GeoPoint, PayPeriodKind, PunchMethod, PunchType};
use crate::reports::TimesheetPeriod;

/// Body of `POST /attendance/punch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchRequest {
    /// The punching employee.
    pub employee_id: Option<String>,
    /// `CLOCK_IN`, `CLOCK_OUT`, `BREAK_START` or `BREAK_END`.
    #[serde(rename = "type")]
    pub punch_type: Option<PunchType>,
    /// Device latitude.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Device longitude.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Position accuracy in meters.
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Capture method, `APP` when absent.
    #[serde(default)]
    pub punch_method: Option<PunchMethod>,
    /// Kiosk PIN.
    #[serde(default)]
    pub pin: Option<String>,
    /// Uploaded photo reference.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Work order being punched against.
    #[serde(default)]
    pub work_order_id: Option<String>,
    /// Captured while offline.
    #[serde(default)]
    pub is_offline_punch: Option<bool>,
    /// Device time of an offline punch.
    #[serde(default)]
    pub offline_timestamp: Option<DateTime<Utc>>,
    /// Free-form device description.
    #[serde(default)]
    pub device_info: Option<String>,
    /// Initial notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Client key identifying one logical punch attempt.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl PunchRequest {
    /// Converts the request into a submission from `ip_address`.
    ///
    /// A position is only used when both coordinates are present.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceError::Validation`] if `employeeId` or `type` is missing.
    pub fn into_submission(self, ip_address: String) -> AttendanceResult<PunchSubmission> {
        let (Some(employee_id), Some(punch_type)) = (self.employee_id, self.punch_type) else {
            return Err(AttendanceError::validation(
                "employeeId and type are required",
            ));
        };

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
                accuracy: self.accuracy,
            }),
            _ => None,
        };

        Ok(PunchSubmission {
            employee_id,
            punch_type,
            location,
            punch_method: self.punch_method.unwrap_or_default(),
            pin: self.pin,
            photo_url: self.photo_url,
            work_order_id: self.work_order_id,
            is_offline_punch: self.is_offline_punch.unwrap_or(false),
            offline_timestamp: self.offline_timestamp,
            device_info: self.device_info,
            notes: self.notes,
            ip_address,
            idempotency_key: self.idempotency_key,
        })
    }
}

/// Body of `POST /attendance/review`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// `approve`, `reject` or `edit`.
    pub action: Option<String>,
    /// The punch under review.
    pub punch_id: Option<Uuid>,
    /// Rejection reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Corrected event time, for edits.
    #[serde(default)]
    pub new_timestamp: Option<DateTime<Utc>>,
    /// Editor's note.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query of `GET /attendance/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    /// The employee.
    pub employee_id: Option<String>,
}

/// Query of `GET /attendance/punch`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// The employee.
    pub employee_id: Option<String>,
    /// First organization-local day, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Last organization-local day, inclusive.
    pub end_date: Option<NaiveDate>,
    /// Maximum punches returned.
    pub limit: Option<usize>,
}

/// Query of `GET /attendance/review`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueQuery {
    /// Only punches attributed to this shop.
    pub shop_id: Option<String>,
    /// Days to look back.
    pub days_back: Option<u32>,
    /// Only flagged punches.
    pub only_flagged: Option<bool>,
}

/// Query of `GET /attendance/whos-working`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhosWorkingQuery {
    /// Only members of this shop.
    pub shop_id: Option<String>,
}

/// Query of `GET /attendance/timesheets`.
///
/// `startDate` and `endDate` together take precedence over `period`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetQuery {
    /// Only this employee.
    pub employee_id: Option<String>,
    /// Only punches attributed to this shop.
    pub shop_id: Option<String>,
    /// `today`, `week`, `month` or `pay-period`; `week` when absent.
    pub period: Option<TimesheetPeriod>,
    /// First organization-local day, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Last organization-local day, inclusive.
    pub end_date: Option<NaiveDate>,
}

/// Query of the payroll endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollQuery {
    /// Period length; the organization default when absent.
    pub period: Option<PayPeriodKind>,
}
