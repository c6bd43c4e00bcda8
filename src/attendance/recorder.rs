//! Punch validation and recording.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::locks::EmployeeLocks;
use crate::calculation::{
    AttendanceState, BreakPolicy, GeofenceResolution, collect_candidates, derive_state,
    resolve_geofence, validate_transition,
};
use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{Employee, GeoPoint, PunchMethod, PunchRecord, PunchType};
use crate::security::verify_pin;
use crate::store::{AttendanceStore, InsertOutcome, PunchQuery};

/// A punch as submitted by a device.
#[derive(Debug, Clone)]
pub struct PunchSubmission {
    /// The punching employee.
    pub employee_id: String,
    /// The kind of event.
    pub punch_type: PunchType,
    /// Device position, if reported.
    pub location: Option<GeoPoint>,
    /// How the punch was captured.
    pub punch_method: PunchMethod,
    /// PIN entered on a kiosk, required for [`PunchMethod::Pin`].
    pub pin: Option<String>,
    /// Uploaded photo reference.
    pub photo_url: Option<String>,
    /// Work order being punched against.
    pub work_order_id: Option<String>,
    /// Whether the punch was captured offline.
    pub is_offline_punch: bool,
    /// When an offline punch actually happened.
    pub offline_timestamp: Option<DateTime<Utc>>,
    /// Free-form device description.
    pub device_info: Option<String>,
    /// Initial notes.
    pub notes: Option<String>,
    /// Submitting client address.
    pub ip_address: String,
    /// Client key identifying one logical punch attempt.
    pub idempotency_key: Option<String>,
}

impl PunchSubmission {
    /// Creates a bare app punch with no location.
    pub fn new(employee_id: impl Into<String>, punch_type: PunchType) -> Self {
        Self {
            employee_id: employee_id.into(),
            punch_type,
            location: None,
            punch_method: PunchMethod::App,
            pin: None,
            photo_url: None,
            work_order_id: None,
            is_offline_punch: false,
            offline_timestamp: None,
            device_info: None,
            notes: None,
            ip_address: "unknown".to_string(),
            idempotency_key: None,
        }
    }

    /// Sets the device position.
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(GeoPoint::new(latitude, longitude));
        self
    }

    /// Sets the idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Returns the event time: the device time for offline punches, else receipt time.
    fn event_time(&self, received_at: DateTime<Utc>) -> DateTime<Utc> {
        match (self.is_offline_punch, self.offline_timestamp) {
            (true, Some(timestamp)) => timestamp,
            _ => received_at,
        }
    }

    fn validate(&self) -> AttendanceResult<()> {
        if self.employee_id.trim().is_empty() {
            return Err(AttendanceError::validation("employeeId and type are required"));
        }
        if let Some(point) = &self.location {
            if !(-90.0..=90.0).contains(&point.latitude)
                || !(-180.0..=180.0).contains(&point.longitude)
            {
                return Err(AttendanceError::validation(format!(
                    "Coordinates out of range: {}, {}",
                    point.latitude, point.longitude
                )));
            }
            if point.accuracy.is_some_and(|a| a < 0.0) {
                return Err(AttendanceError::validation("accuracy must not be negative"));
            }
        }
        Ok(())
    }
}

/// The outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct PunchReceipt {
    /// The stored punch.
    pub punch: PunchRecord,
    /// Minutes since the open clock-in, for CLOCK_OUT punches.
    pub shift_duration_minutes: Option<i64>,
    /// True when the idempotency key was already recorded and nothing was inserted.
    pub replayed: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// Validates punches against the attendance state machine and geofences, then stores them.
///
/// Validation and insert for one employee run under that employee's lock,
/// so concurrent submissions cannot both observe an OUT state.
pub struct PunchRecorder {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    locks: EmployeeLocks,
    break_policy: BreakPolicy,
}

impl PunchRecorder {
    /// Creates a recorder over `store`.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        break_policy: BreakPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            locks: EmployeeLocks::new(),
            break_policy,
        }
    }

    /// Returns the break policy in force.
    pub fn break_policy(&self) -> BreakPolicy {
        self.break_policy
    }

    /// Validates and records a punch.
    ///
    /// Checks run in this order: input validation, employee lookup, PIN,
    /// idempotency replay, event-time ordering, state transition, geofence.
    /// Nothing is persisted unless every check passes.
    ///
    /// # Errors
    ///
    /// - [`AttendanceError::Validation`] for malformed input or a missing PIN
    /// - [`AttendanceError::EmployeeNotFound`] for an unknown employee
    /// - [`AttendanceError::InvalidPin`] for a wrong PIN
    /// - [`AttendanceError::OutOfOrderPunch`] for an offline punch timed before
    ///   the employee's latest recorded punch
    /// - [`AttendanceError::AlreadyClockedIn`], [`AttendanceError::NotClockedIn`]
    ///   or [`AttendanceError::BreakConflict`] for illegal transitions
    /// - [`AttendanceError::OutsideGeofence`] when a required geofence is not satisfied
    pub async fn record(&self, submission: PunchSubmission) -> AttendanceResult<PunchReceipt> {
        submission.validate()?;

        let employee = self
            .store
            .employee(&submission.employee_id)
            .await?
            .ok_or_else(|| AttendanceError::EmployeeNotFound {
                employee_id: submission.employee_id.clone(),
            })?;

        if submission.punch_method == PunchMethod::Pin {
            check_pin(&employee, submission.pin.as_deref())?;
        }

        let _guard = self.locks.acquire(&employee.id).await;

        if let Some(key) = &submission.idempotency_key {
            if let Some(existing) = self.store.find_by_idempotency_key(&employee.id, key).await? {
                debug!(punch_id = %existing.id, "returning previously recorded punch");
                return Ok(self.replayed(existing));
            }
        }

        let received_at = self.clock.now();
        let timestamp = submission.event_time(received_at);
        if timestamp > received_at {
            return Err(AttendanceError::validation(format!(
                "offlineTimestamp {} is in the future",
                timestamp.to_rfc3339()
            )));
        }

        let history = self
            .store
            .punches(&PunchQuery {
                employee_id: Some(employee.id.clone()),
                ..PunchQuery::default()
            })
            .await?;
        // A backdated punch may not land between punches already on record
        if let Some(latest) = history.last().filter(|p| p.timestamp > timestamp) {
            return Err(AttendanceError::OutOfOrderPunch {
                timestamp,
                latest_punch: latest.timestamp,
            });
        }
        let state = derive_state(&history);
        validate_transition(state, submission.punch_type, timestamp, self.break_policy)?;

        let candidates = collect_candidates(
            &self.store.shop_geofences_for(&employee.id).await?,
            &self.store.assigned_geofences_for(&employee.id).await?,
        );
        let resolution = resolve_geofence(submission.location.as_ref(), &candidates);
        if let GeofenceResolution::Violation { required, .. } = &resolution {
            warn!(
                employee_id = %employee.id,
                geofence_id = %required.geofence_id,
                distance_meters = required.distance_meters,
                "Punch outside required geofence"
            );
            return Err(AttendanceError::OutsideGeofence {
                distance_meters: required.distance_meters,
                geofence_id: required.geofence_id.clone(),
            });
        }

        let punch = build_punch(submission, timestamp, received_at, &resolution);
        let punch = match self.store.insert_punch(punch).await? {
            InsertOutcome::Inserted(punch) => punch,
            InsertOutcome::Duplicate(existing) => return Ok(self.replayed(existing)),
        };

        let shift_duration_minutes = match punch.punch_type {
            PunchType::ClockOut => state
                .open_clock_in()
                .map(|clock_in| whole_minutes(punch.timestamp - clock_in)),
            _ => None,
        };
        let message = self.message(&punch, shift_duration_minutes).await?;

        info!(
            employee_id = %punch.employee_id,
            punch_id = %punch.id,
            punch_type = ?punch.punch_type,
            within_geofence = ?punch.is_within_geofence,
            offline = punch.is_offline_punch,
            "Punch recorded"
        );

        Ok(PunchReceipt {
            punch,
            shift_duration_minutes,
            replayed: false,
            message,
        })
    }

    /// Returns the derived state of an employee.
    pub async fn current_state(&self, employee_id: &str) -> AttendanceResult<AttendanceState> {
        let history = self
            .store
            .punches(&PunchQuery {
                employee_id: Some(employee_id.to_string()),
                ..PunchQuery::default()
            })
            .await?;
        Ok(derive_state(&history))
    }

    fn replayed(&self, punch: PunchRecord) -> PunchReceipt {
        PunchReceipt {
            message: format!("{} already recorded", capitalize(punch.punch_type.label())),
            punch,
            shift_duration_minutes: None,
            replayed: true,
        }
    }

    async fn message(
        &self,
        punch: &PunchRecord,
        shift_duration_minutes: Option<i64>,
    ) -> AttendanceResult<String> {
        Ok(match punch.punch_type {
            PunchType::ClockIn => {
                let shop_name = match &punch.shop_id {
                    Some(shop_id) => self.store.shop(shop_id).await?.map(|s| s.name),
                    None => None,
                };
                format!("Clocked in at {}", shop_name.as_deref().unwrap_or("shop"))
            }
            PunchType::ClockOut => {
                let minutes = shift_duration_minutes.unwrap_or(0);
                format!(
                    "Clocked out. Shift duration: {}h {}m",
                    minutes / 60,
                    minutes % 60
                )
            }
            PunchType::BreakStart | PunchType::BreakEnd => {
                format!("{} recorded", punch.punch_type.label())
            }
        })
    }
}

fn check_pin(employee: &Employee, pin: Option<&str>) -> AttendanceResult<()> {
    let pin = pin
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AttendanceError::validation("PIN is required for PIN punch method"))?;
    match &employee.pin_hash {
        Some(hash) => verify_pin(pin, hash),
        None => Err(AttendanceError::InvalidPin),
    }
}

fn build_punch(
    submission: PunchSubmission,
    timestamp: DateTime<Utc>,
    received_at: DateTime<Utc>,
    resolution: &GeofenceResolution,
) -> PunchRecord {
    let mut punch = PunchRecord::new(
        submission.employee_id,
        submission.punch_type,
        timestamp,
        received_at,
    );
    if let Some(point) = submission.location {
        punch.latitude = Some(point.latitude);
        punch.longitude = Some(point.longitude);
        punch.accuracy = point.accuracy;
    }
    if let Some(nearest) = resolution.nearest() {
        punch.geofence_id = Some(nearest.geofence_id.clone());
        punch.shop_id = nearest.shop_id.clone();
        punch.is_within_geofence = Some(nearest.is_within);
        punch.distance_from_geofence = Some(nearest.distance_meters);
    }
    punch.punch_method = submission.punch_method;
    punch.is_offline_punch = submission.is_offline_punch;
    punch.offline_synced_at = submission.is_offline_punch.then_some(received_at);
    punch.notes = submission.notes;
    punch.photo_url = submission.photo_url;
    punch.work_order_id = submission.work_order_id;
    punch.device_info = submission.device_info;
    punch.ip_address = submission.ip_address;
    punch.idempotency_key = submission.idempotency_key;
    punch
}

/// Rounds a duration to the nearest whole minute.
fn whole_minutes(duration: TimeDelta) -> i64 {
    (duration.num_seconds() + 30).div_euclid(60)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::clock::FixedClock;
    use crate::models::{Geofence, PayType, Shop, ShopAssignment};
    use crate::security::hash_pin;
    use crate::store::{MemoryStore, Roster};

    const MAIN_LAT: f64 = 40.7128;
    const MAIN_LON: f64 = -74.006;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 13, 14, 0, 0).unwrap()
    }

    fn employee(id: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: "Alex Rivera".to_string(),
            role: "MECHANIC".to_string(),
            pay_type: PayType::Hourly,
            pay_rate: rust_decimal::Decimal::new(20, 0),
            overtime_rate: None,
            pin_hash: None,
            is_active: true,
        }
    }

    fn roster(required: bool) -> Roster {
        let mut kiosk = employee("emp_kiosk");
        kiosk.pin_hash = Some(hash_pin("4821").unwrap());
        Roster {
            shops: vec![Shop {
                id: "shop_main".to_string(),
                name: "Main Street Garage".to_string(),
            }],
            geofences: vec![Geofence {
                id: "gf_main".to_string(),
                name: "Main bay".to_string(),
                shop_id: Some("shop_main".to_string()),
                latitude: MAIN_LAT,
                longitude: MAIN_LON,
                radius_meters: 150.0,
                is_required: required,
                is_active: true,
            }],
            employees: vec![employee("emp_001"), employee("emp_remote"), kiosk],
            shop_assignments: vec![ShopAssignment {
                employee_id: "emp_001".to_string(),
                shop_id: "shop_main".to_string(),
            }],
            ..Roster::default()
        }
    }

    fn recorder(required: bool) -> (PunchRecorder, Arc<FixedClock>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_roster(roster(required)));
        let clock = Arc::new(FixedClock::new(start()));
        let recorder = PunchRecorder::new(store.clone(), clock.clone(), BreakPolicy::Advisory);
        (recorder, clock, store)
    }

    #[tokio::test]
    async fn test_clock_in_at_shop_resolves_geofence() {
        let (recorder, _, _) = recorder(true);
        let receipt = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).at(MAIN_LAT, MAIN_LON))
            .await
            .unwrap();

        assert_eq!(receipt.punch.geofence_id.as_deref(), Some("gf_main"));
        assert_eq!(receipt.punch.shop_id.as_deref(), Some("shop_main"));
        assert_eq!(receipt.punch.is_within_geofence, Some(true));
        assert_eq!(receipt.punch.distance_from_geofence, Some(0.0));
        assert_eq!(receipt.message, "Clocked in at Main Street Garage");
        assert!(!receipt.replayed);
    }

    #[tokio::test]
    async fn test_clock_out_reports_shift_duration() {
        let (recorder, clock, _) = recorder(false);
        recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn))
            .await
            .unwrap();
        clock.advance(TimeDelta::minutes(8 * 60 + 15));

        let receipt = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockOut))
            .await
            .unwrap();
        assert_eq!(receipt.shift_duration_minutes, Some(495));
        assert_eq!(receipt.message, "Clocked out. Shift duration: 8h 15m");
    }

    #[tokio::test]
    async fn test_outside_required_geofence_is_rejected_and_not_stored() {
        let (recorder, _, store) = recorder(true);
        let result = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).at(40.75, MAIN_LON))
            .await;

        match result {
            Err(AttendanceError::OutsideGeofence { geofence_id, distance_meters }) => {
                assert_eq!(geofence_id, "gf_main");
                assert!(distance_meters > 4000.0);
            }
            other => panic!("expected OutsideGeofence, got {:?}", other.map(|r| r.punch)),
        }
        assert_eq!(store.punch_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_coordinates_with_required_geofence_succeeds() {
        let (recorder, _, _) = recorder(true);
        let receipt = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn))
            .await
            .unwrap();
        assert_eq!(receipt.punch.is_within_geofence, None);
        assert_eq!(receipt.punch.geofence_id, None);
        assert_eq!(receipt.message, "Clocked in at shop");
    }

    #[tokio::test]
    async fn test_employee_without_geofences_always_proceeds() {
        let (recorder, _, _) = recorder(true);
        let receipt = recorder
            .record(PunchSubmission::new("emp_remote", PunchType::ClockIn).at(51.5, -0.12))
            .await
            .unwrap();
        assert_eq!(receipt.punch.geofence_id, None);
    }

    #[tokio::test]
    async fn test_unknown_employee() {
        let (recorder, _, _) = recorder(false);
        let result = recorder
            .record(PunchSubmission::new("emp_404", PunchType::ClockIn))
            .await;
        assert!(matches!(result, Err(AttendanceError::EmployeeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_employee_id_is_validation_error() {
        let (recorder, _, _) = recorder(false);
        let result = recorder
            .record(PunchSubmission::new("  ", PunchType::ClockIn))
            .await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_out_of_range_coordinates_are_rejected() {
        let (recorder, _, _) = recorder(false);
        let result = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).at(91.0, 0.0))
            .await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_pin_method_checks() {
        let (recorder, _, _) = recorder(false);

        let mut missing = PunchSubmission::new("emp_kiosk", PunchType::ClockIn);
        missing.punch_method = PunchMethod::Pin;
        assert!(matches!(
            recorder.record(missing.clone()).await,
            Err(AttendanceError::Validation { .. })
        ));

        let mut wrong = missing.clone();
        wrong.pin = Some("0000".to_string());
        assert!(matches!(
            recorder.record(wrong).await,
            Err(AttendanceError::InvalidPin)
        ));

        let mut right = missing;
        right.pin = Some("4821".to_string());
        let receipt = recorder.record(right).await.unwrap();
        assert_eq!(receipt.punch.punch_method, PunchMethod::Pin);
    }

    #[tokio::test]
    async fn test_pin_method_without_stored_hash_is_unauthorized() {
        let (recorder, _, _) = recorder(false);
        let mut submission = PunchSubmission::new("emp_001", PunchType::ClockIn);
        submission.punch_method = PunchMethod::Pin;
        submission.pin = Some("1234".to_string());
        assert!(matches!(
            recorder.record(submission).await,
            Err(AttendanceError::InvalidPin)
        ));
    }

    #[tokio::test]
    async fn test_idempotent_replay_returns_stored_punch() {
        let (recorder, clock, store) = recorder(false);
        let first = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).with_idempotency_key("k-1"))
            .await
            .unwrap();
        clock.advance(TimeDelta::minutes(2));
        let retry = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).with_idempotency_key("k-1"))
            .await
            .unwrap();

        assert!(retry.replayed);
        assert_eq!(retry.punch.id, first.punch.id);
        assert_eq!(store.punch_count().await, 1);
    }

    #[tokio::test]
    async fn test_offline_punch_uses_device_timestamp() {
        let (recorder, _, _) = recorder(false);
        let mut submission = PunchSubmission::new("emp_001", PunchType::ClockIn);
        submission.is_offline_punch = true;
        submission.offline_timestamp = Some(start() - TimeDelta::hours(1));

        let receipt = recorder.record(submission).await.unwrap();
        assert_eq!(receipt.punch.timestamp, start() - TimeDelta::hours(1));
        assert_eq!(receipt.punch.created_at, start());
        assert_eq!(receipt.punch.offline_synced_at, Some(start()));
    }

    fn offline(punch_type: PunchType, timestamp: DateTime<Utc>) -> PunchSubmission {
        let mut submission = PunchSubmission::new("emp_001", punch_type);
        submission.is_offline_punch = true;
        submission.offline_timestamp = Some(timestamp);
        submission
    }

    #[tokio::test]
    async fn test_backdated_clock_in_inside_closed_shift_is_rejected() {
        let (recorder, clock, store) = recorder(false);
        clock.set(start() - TimeDelta::hours(5));
        recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn))
            .await
            .unwrap();
        clock.set(start() + TimeDelta::hours(3));
        recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockOut))
            .await
            .unwrap();

        // Synced after the shift was closed, but captured in the middle of it
        let result = recorder
            .record(offline(PunchType::ClockIn, start() - TimeDelta::hours(2)))
            .await;

        match result {
            Err(AttendanceError::OutOfOrderPunch { timestamp, latest_punch }) => {
                assert_eq!(timestamp, start() - TimeDelta::hours(2));
                assert_eq!(latest_punch, start() + TimeDelta::hours(3));
            }
            other => panic!("expected OutOfOrderPunch, got {:?}", other.map(|r| r.punch)),
        }
        let punches = store
            .punches(&PunchQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.punch_type)
            .collect::<Vec<_>>();
        assert_eq!(punches, vec![PunchType::ClockIn, PunchType::ClockOut]);
    }

    #[tokio::test]
    async fn test_backdated_punch_after_latest_is_accepted() {
        let (recorder, clock, _) = recorder(false);
        clock.set(start() - TimeDelta::hours(5));
        recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn))
            .await
            .unwrap();
        clock.set(start());

        let receipt = recorder
            .record(offline(PunchType::ClockOut, start() - TimeDelta::hours(1)))
            .await
            .unwrap();
        assert_eq!(receipt.shift_duration_minutes, Some(240));
    }

    #[tokio::test]
    async fn test_offline_timestamp_in_the_future_is_rejected() {
        let (recorder, _, store) = recorder(false);
        let result = recorder
            .record(offline(PunchType::ClockIn, start() + TimeDelta::minutes(5)))
            .await;
        assert!(matches!(result, Err(AttendanceError::Validation { .. })));
        assert_eq!(store.punch_count().await, 0);
    }

    #[tokio::test]
    async fn test_idempotency_key_does_not_cross_employees() {
        let (recorder, _, store) = recorder(false);
        let first = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockIn).with_idempotency_key("k"))
            .await
            .unwrap();
        let second = recorder
            .record(PunchSubmission::new("emp_remote", PunchType::ClockIn).with_idempotency_key("k"))
            .await
            .unwrap();

        assert!(!second.replayed);
        assert_eq!(second.punch.employee_id, "emp_remote");
        assert_ne!(second.punch.id, first.punch.id);
        assert_eq!(store.punch_count().await, 2);
    }

    #[tokio::test]
    async fn test_clock_out_during_break_is_not_clocked_in() {
        let (recorder, clock, _) = recorder(false);
        for punch_type in [PunchType::ClockIn, PunchType::BreakStart] {
            recorder
                .record(PunchSubmission::new("emp_001", punch_type))
                .await
                .unwrap();
            clock.advance(TimeDelta::minutes(30));
        }

        let result = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockOut))
            .await;
        assert!(matches!(result, Err(AttendanceError::NotClockedIn)));

        recorder
            .record(PunchSubmission::new("emp_001", PunchType::BreakEnd))
            .await
            .unwrap();
        clock.advance(TimeDelta::minutes(30));
        let receipt = recorder
            .record(PunchSubmission::new("emp_001", PunchType::ClockOut))
            .await
            .unwrap();
        assert_eq!(receipt.shift_duration_minutes, Some(90));
    }

    #[tokio::test]
    async fn test_concurrent_clock_ins_yield_one_open_shift() {
        let (recorder, _, store) = recorder(false);
        let recorder = Arc::new(recorder);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    recorder
                        .record(PunchSubmission::new("emp_001", PunchType::ClockIn))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(AttendanceError::AlreadyClockedIn { .. }) => {}
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.punch_count().await, 1);
    }

    #[tokio::test]
    async fn test_break_messages() {
        let (recorder, _, _) = recorder(false);
        let receipt = recorder
            .record(PunchSubmission::new("emp_001", PunchType::BreakStart))
            .await
            .unwrap();
        assert_eq!(receipt.message, "break start recorded");
    }

    #[test]
    fn test_whole_minutes_rounds_to_nearest() {
        assert_eq!(whole_minutes(TimeDelta::seconds(89)), 1);
        assert_eq!(whole_minutes(TimeDelta::seconds(90)), 2);
        assert_eq!(whole_minutes(TimeDelta::zero()), 0);
    }
}
