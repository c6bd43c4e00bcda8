//! Attendance reports: status, history, who's working and the review queue.

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike, Utc};
use serde::Serialize;

use crate::calculation::{AttendanceState, break_duration_since, derive_state};
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{PunchMethod, PunchRecord, PunchType, local_midnight};
use crate::store::{AttendanceStore, PunchQuery};

/// Punches returned by [`punch_history`] when no limit is given.
pub const HISTORY_DEFAULT_LIMIT: usize = 50;

/// Upper bound on the history limit.
pub const HISTORY_MAX_LIMIT: usize = 500;

/// Days looked back by [`review_queue`] when none are given.
pub const REVIEW_DEFAULT_DAYS: u32 = 7;

/// Most recent punches considered by [`review_queue`].
pub const REVIEW_MAX_ENTRIES: usize = 100;

/// Formats whole minutes as `"{h}h {m}m"`.
///
/// # Examples
///
/// ```
/// use attendance_engine::reports::format_minutes;
///
/// assert_eq!(format_minutes(495), "8h 15m");
/// assert_eq!(format_minutes(0), "0h 0m");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub(super) fn floor_minutes(duration: TimeDelta) -> i64 {
    duration.num_minutes().max(0)
}

/// The open shift of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShift {
    /// Clock-in time of the shift.
    pub clock_in_time: DateTime<Utc>,
    /// Shop the clock-in was attributed to.
    pub shop_id: Option<String>,
    /// Minutes since clock-in.
    pub elapsed_minutes: i64,
    /// Minutes spent on break since clock-in.
    pub break_minutes: i64,
    /// Elapsed minus break minutes.
    pub work_minutes: i64,
    /// `elapsed_minutes` as `"{h}h {m}m"`.
    pub elapsed_formatted: String,
    /// `work_minutes` as `"{h}h {m}m"`.
    pub work_formatted: String,
    /// `break_minutes` as `"{h}h {m}m"`.
    pub break_formatted: String,
}

/// Current attendance status of one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStatus {
    /// The employee.
    pub employee_id: String,
    /// `CLOCKED_OUT`, `CLOCKED_IN` or `ON_BREAK`.
    pub status: &'static str,
    /// True while working (not on break).
    pub is_clocked_in: bool,
    /// True while on break.
    pub is_on_break: bool,
    /// Most recent punch by timestamp.
    pub last_punch: Option<PunchRecord>,
    /// The open shift, if any.
    pub current_shift: Option<CurrentShift>,
    /// Punches since local midnight, oldest first.
    pub today_punches: Vec<PunchRecord>,
}

fn current_shift(
    state: AttendanceState,
    punches: &[PunchRecord],
    now: DateTime<Utc>,
) -> Option<CurrentShift> {
    let clock_in = state.open_clock_in()?;
    let shop_id = punches
        .iter()
        .rev()
        .find(|p| p.punch_type == PunchType::ClockIn && p.timestamp == clock_in)
        .and_then(|p| p.shop_id.clone());
    let elapsed_minutes = floor_minutes(now - clock_in);
    let break_minutes = floor_minutes(break_duration_since(punches, clock_in, now));
    let work_minutes = (elapsed_minutes - break_minutes).max(0);

    Some(CurrentShift {
        clock_in_time: clock_in,
        shop_id,
        elapsed_minutes,
        break_minutes,
        work_minutes,
        elapsed_formatted: format_minutes(elapsed_minutes),
        work_formatted: format_minutes(work_minutes),
        break_formatted: format_minutes(break_minutes),
    })
}

/// Builds the status of one employee.
///
/// # Errors
///
/// Returns [`AttendanceError::EmployeeNotFound`] for an unknown employee.
pub async fn employee_status(
    store: &dyn AttendanceStore,
    employee_id: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AttendanceResult<EmployeeStatus> {
    if store.employee(employee_id).await?.is_none() {
        return Err(AttendanceError::EmployeeNotFound {
            employee_id: employee_id.to_string(),
        });
    }

    let punches = store
        .punches(&PunchQuery {
            employee_id: Some(employee_id.to_string()),
            ..PunchQuery::default()
        })
        .await?;
    let state = derive_state(&punches);
    let today_start = local_midnight(now.with_timezone(&offset).date_naive(), offset);

    Ok(EmployeeStatus {
        employee_id: employee_id.to_string(),
        status: state.status_code(),
        is_clocked_in: matches!(state, AttendanceState::In { .. }),
        is_on_break: matches!(state, AttendanceState::OnBreak { .. }),
        last_punch: punches.last().cloned(),
        current_shift: current_shift(state, &punches, now),
        today_punches: punches
            .iter()
            .filter(|p| p.timestamp >= today_start)
            .cloned()
            .collect(),
    })
}

/// Lists punches newest first.
///
/// `limit` defaults to [`HISTORY_DEFAULT_LIMIT`] and is capped at [`HISTORY_MAX_LIMIT`].
pub async fn punch_history(
    store: &dyn AttendanceStore,
    query: &PunchQuery,
    limit: Option<usize>,
) -> AttendanceResult<Vec<PunchRecord>> {
    let limit = limit.unwrap_or(HISTORY_DEFAULT_LIMIT).min(HISTORY_MAX_LIMIT);
    let mut punches = store.punches(query).await?;
    punches.reverse();
    punches.truncate(limit);
    Ok(punches)
}

/// An employee with an open shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingEmployee {
    /// The employee.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Job role.
    pub role: String,
    /// `CLOCKED_IN` or `ON_BREAK`.
    pub status: &'static str,
    /// Clock-in time of the open shift.
    pub clock_in_time: DateTime<Utc>,
    /// Minutes since clock-in.
    pub elapsed_minutes: i64,
    /// `elapsed_minutes` as `"{h}h {m}m"`.
    pub elapsed_formatted: String,
}

/// Everyone currently on shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhosWorking {
    /// Employees with an open shift, longest-running first.
    pub employees: Vec<WorkingEmployee>,
    /// Number working.
    pub clocked_in: usize,
    /// Number on break.
    pub on_break: usize,
}

/// Lists employees with an open shift, optionally restricted to a shop's members.
pub async fn whos_working(
    store: &dyn AttendanceStore,
    shop_id: Option<&str>,
    now: DateTime<Utc>,
) -> AttendanceResult<WhosWorking> {
    let members = match shop_id {
        Some(shop_id) => Some(store.shop_members(shop_id).await?),
        None => None,
    };

    let mut working = Vec::new();
    for employee in store.employees().await? {
        if members.as_ref().is_some_and(|m| !m.contains(&employee.id)) {
            continue;
        }
        let punches = store
            .punches(&PunchQuery {
                employee_id: Some(employee.id.clone()),
                ..PunchQuery::default()
            })
            .await?;
        let state = derive_state(&punches);
        if let Some(clock_in) = state.open_clock_in() {
            let elapsed_minutes = floor_minutes(now - clock_in);
            working.push(WorkingEmployee {
                employee_id: employee.id,
                name: employee.name,
                role: employee.role,
                status: state.status_code(),
                clock_in_time: clock_in,
                elapsed_minutes,
                elapsed_formatted: format_minutes(elapsed_minutes),
            });
        }
    }
    working.sort_by_key(|w| w.clock_in_time);

    let on_break = working.iter().filter(|w| w.status == "ON_BREAK").count();
    Ok(WhosWorking {
        clocked_in: working.len() - on_break,
        on_break,
        employees: working,
    })
}

/// Reasons a punch may need a manager's attention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFlags {
    /// Recorded outside the nearest geofence.
    pub outside_geofence: bool,
    /// Captured offline and synced later.
    pub offline_punch: bool,
    /// Entered manually.
    pub manual_entry: bool,
    /// A clock-in without a photo.
    pub missing_photo: bool,
    /// Local time before 04:00 or after 22:59.
    pub unusual: bool,
}

impl ReviewFlags {
    /// Computes the flags of a punch in the organization's time zone.
    pub fn for_punch(punch: &PunchRecord, offset: FixedOffset) -> Self {
        let hour = punch.timestamp.with_timezone(&offset).hour();
        Self {
            outside_geofence: punch.is_within_geofence == Some(false),
            offline_punch: punch.is_offline_punch,
            manual_entry: punch.punch_method == PunchMethod::Manual,
            missing_photo: punch.punch_type == PunchType::ClockIn && punch.photo_url.is_none(),
            unusual: !(4..=22).contains(&hour),
        }
    }

    /// Returns true if any flag is set.
    pub fn any(&self) -> bool {
        self.outside_geofence
            || self.offline_punch
            || self.manual_entry
            || self.missing_photo
            || self.unusual
    }
}

/// One punch in the review queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    /// The punch.
    #[serde(flatten)]
    pub punch: PunchRecord,
    /// Name of the punching employee, if still on the roster.
    pub employee_name: Option<String>,
    /// Review flags.
    pub flags: ReviewFlags,
}

/// Counts over the review queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Entries returned.
    pub total: usize,
    /// Entries with any flag.
    pub flagged: usize,
    /// Entries outside the geofence.
    pub outside_geofence: usize,
    /// Offline entries.
    pub offline: usize,
    /// Manual entries.
    pub manual: usize,
}

/// The window the review queue covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPeriod {
    /// Local midnight `days` days ago.
    pub start: DateTime<Utc>,
    /// When the queue was built.
    pub end: DateTime<Utc>,
    /// Days looked back.
    pub days: u32,
}

/// Punches awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueue {
    /// Entries, newest first.
    pub punches: Vec<ReviewEntry>,
    /// Counts over `punches`.
    pub summary: ReviewSummary,
    /// The window covered.
    pub period: ReviewPeriod,
}

/// Builds the review queue.
///
/// Takes the [`REVIEW_MAX_ENTRIES`] most recent punches since local midnight
/// `days_back` days ago (optionally for one shop) and, if `only_flagged`,
/// drops the unflagged ones.
pub async fn review_queue(
    store: &dyn AttendanceStore,
    shop_id: Option<&str>,
    days_back: u32,
    only_flagged: bool,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AttendanceResult<ReviewQueue> {
    let today = now.with_timezone(&offset).date_naive();
    let first_day = today
        .checked_sub_days(chrono::Days::new(u64::from(days_back)))
        .ok_or_else(|| AttendanceError::validation("daysBack is out of range"))?;
    let start = local_midnight(first_day, offset);

    let query = PunchQuery {
        shop_id: shop_id.map(str::to_string),
        since: Some(start),
        ..PunchQuery::default()
    };
    let recent = punch_history(store, &query, Some(REVIEW_MAX_ENTRIES)).await?;
    let employees = store.employees().await?;

    let mut summary = ReviewSummary::default();
    let mut punches = Vec::new();
    for punch in recent {
        let flags = ReviewFlags::for_punch(&punch, offset);
        if only_flagged && !flags.any() {
            continue;
        }
        summary.total += 1;
        summary.flagged += usize::from(flags.any());
        summary.outside_geofence += usize::from(flags.outside_geofence);
        summary.offline += usize::from(flags.offline_punch);
        summary.manual += usize::from(flags.manual_entry);
        punches.push(ReviewEntry {
            employee_name: employees
                .iter()
                .find(|e| e.id == punch.employee_id)
                .map(|e| e.name.clone()),
            punch,
            flags,
        });
    }

    Ok(ReviewQueue {
        punches,
        summary,
        period: ReviewPeriod {
            start,
            end: now,
            days: days_back,
        },
    })
}
