//! Punch model and related types.
//!
//! A punch is a single timestamped attendance event. Punches are created
//! once per event, never hard-deleted, and only amended through the review
//! workflow (an appended audit note or a corrected timestamp).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of attendance event a punch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PunchType {
    /// Start of a shift.
    ClockIn,
    /// End of a shift.
    ClockOut,
    /// Start of a break within a shift.
    BreakStart,
    /// End of a break within a shift.
    BreakEnd,
}

impl PunchType {
    /// Returns the lowercase human-readable label (e.g. "break start").
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::PunchType;
    ///
    /// assert_eq!(PunchType::BreakStart.label(), "break start");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            PunchType::ClockIn => "clock in",
            PunchType::ClockOut => "clock out",
            PunchType::BreakStart => "break start",
            PunchType::BreakEnd => "break end",
        }
    }

    /// Returns true for break punches.
    pub fn is_break(&self) -> bool {
        matches!(self, PunchType::BreakStart | PunchType::BreakEnd)
    }
}

/// How the punch was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PunchMethod {
    /// Employee mobile app.
    #[default]
    App,
    /// Kiosk PIN entry.
    Pin,
    /// QR code scan.
    QrCode,
    /// Facial recognition.
    Facial,
    /// Manual entry by a manager.
    Manual,
    /// Shared kiosk device.
    Kiosk,
}

/// A device-reported position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    /// Creates a point without an accuracy reading.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }
}

/// A persisted attendance event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchRecord {
    /// Unique identifier for the punch.
    pub id: Uuid,
    /// The employee who punched.
    pub employee_id: String,
    /// The kind of event.
    #[serde(rename = "type")]
    pub punch_type: PunchType,
    /// When the event happened. Backdated for offline punches.
    pub timestamp: DateTime<Utc>,
    /// Latitude of the device, if reported.
    pub latitude: Option<f64>,
    /// Longitude of the device, if reported.
    pub longitude: Option<f64>,
    /// Accuracy of the reported position in meters.
    pub accuracy: Option<f64>,
    /// Nearest candidate geofence, if one was resolved.
    pub geofence_id: Option<String>,
    /// Shop the punch was attributed to.
    pub shop_id: Option<String>,
    /// Containment in the nearest geofence; `None` when unknown.
    pub is_within_geofence: Option<bool>,
    /// Distance to the nearest geofence center in meters.
    pub distance_from_geofence: Option<f64>,
    /// How the punch was captured.
    pub punch_method: PunchMethod,
    /// Whether the punch was captured while the device was offline.
    pub is_offline_punch: bool,
    /// When an offline punch reached the server.
    pub offline_synced_at: Option<DateTime<Utc>>,
    /// Append-only audit text.
    pub notes: Option<String>,
    /// Uploaded photo reference.
    pub photo_url: Option<String>,
    /// Work order the employee punched against.
    pub work_order_id: Option<String>,
    /// Free-form device description.
    pub device_info: Option<String>,
    /// Submitting client address.
    pub ip_address: String,
    /// Client-generated key identifying one logical punch attempt.
    pub idempotency_key: Option<String>,
    /// Server receipt time.
    pub created_at: DateTime<Utc>,
}

impl PunchRecord {
    /// Creates a punch with no location, geofence or audit data.
    pub fn new(
        employee_id: impl Into<String>,
        punch_type: PunchType,
        timestamp: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            punch_type,
            timestamp,
            latitude: None,
            longitude: None,
            accuracy: None,
            geofence_id: None,
            shop_id: None,
            is_within_geofence: None,
            distance_from_geofence: None,
            punch_method: PunchMethod::App,
            is_offline_punch: false,
            offline_synced_at: None,
            notes: None,
            photo_url: None,
            work_order_id: None,
            device_info: None,
            ip_address: "unknown".to_string(),
            idempotency_key: None,
            created_at,
        }
    }

    /// Returns the reported location, if both coordinates are present.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
                accuracy: self.accuracy,
            }),
            _ => None,
        }
    }

    /// Appends a line to the audit notes.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::{PunchRecord, PunchType};
    /// use chrono::Utc;
    ///
    /// let now = Utc::now();
    /// let mut punch = PunchRecord::new("emp_001", PunchType::ClockIn, now, now);
    /// punch.append_note("[APPROVED]");
    /// punch.append_note("[EDITED: late badge]");
    /// assert_eq!(punch.notes.as_deref(), Some("[APPROVED]\n[EDITED: late badge]"));
    /// ```
    pub fn append_note(&mut self, line: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
            _ => line.to_string(),
        });
    }
}
