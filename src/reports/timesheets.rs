//! Timesheets: punches regrouped into shifts with their breaks and overtime.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{OvertimeRule, PayPeriod, PayPeriodKind, PunchRecord, PunchType, local_midnight};
use crate::store::{AttendanceStore, PunchQuery};

use super::attendance::floor_minutes;

/// Daily overtime threshold used when no active rule sets one.
pub const DEFAULT_DAILY_THRESHOLD_MINUTES: i64 = 8 * 60;

/// A named reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimesheetPeriod {
    /// Since local midnight.
    Today,
    /// Since the start of the week (Sunday).
    #[default]
    Week,
    /// Since the first of the month.
    Month,
    /// The organization's current pay period.
    PayPeriod,
}

impl TimesheetPeriod {
    /// The label reported back to the caller.
    pub fn label(&self) -> &'static str {
        match self {
            TimesheetPeriod::Today => "today",
            TimesheetPeriod::Week => "week",
            TimesheetPeriod::Month => "month",
            TimesheetPeriod::PayPeriod => "pay-period",
        }
    }
}

/// The instants a timesheet covers, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetWindow {
    /// First instant covered.
    pub start: DateTime<Utc>,
    /// Last instant covered.
    pub end: DateTime<Utc>,
    /// `today`, `week`, `month`, `pay-period` or `custom`.
    pub label: String,
}

impl TimesheetWindow {
    /// The window of `period` ending at `now`.
    ///
    /// `pay_period` is the organization's pay period length, used for
    /// [`TimesheetPeriod::PayPeriod`].
    pub fn for_period(
        period: TimesheetPeriod,
        pay_period: PayPeriodKind,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let today = now.with_timezone(&offset).date_naive();
        let start = match period {
            TimesheetPeriod::Today => local_midnight(today, offset),
            TimesheetPeriod::Week => local_midnight(PayPeriodKind::Week.first_day(today), offset),
            TimesheetPeriod::Month => local_midnight(PayPeriodKind::Month.first_day(today), offset),
            TimesheetPeriod::PayPeriod => PayPeriod::containing(pay_period, now, offset).start,
        };
        Self {
            start,
            end: now,
            label: period.label().to_string(),
        }
    }

    /// The organization-local days `first..=last`.
    ///
    /// # Errors
    ///
    /// Returns [`AttendanceError::Validation`] if `last` precedes `first`.
    pub fn custom(first: NaiveDate, last: NaiveDate, offset: FixedOffset) -> AttendanceResult<Self> {
        if last < first {
            return Err(AttendanceError::validation(
                "endDate must not be before startDate",
            ));
        }
        let after_last = last
            .succ_opt()
            .ok_or_else(|| AttendanceError::validation("endDate is out of range"))?;
        Ok(Self {
            start: local_midnight(first, offset),
            end: local_midnight(after_last, offset) - TimeDelta::milliseconds(1),
            label: "custom".to_string(),
        })
    }
}

/// One break within a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftBreak {
    /// BREAK_START time.
    pub start: DateTime<Utc>,
    /// BREAK_END time, absent while the break is open.
    pub end: Option<DateTime<Utc>>,
    /// Whole minutes of a closed break, 0 while open.
    pub duration_minutes: i64,
}

/// A clock-in and everything up to its clock-out.
///
/// Minute totals stay 0 until the shift is complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// The CLOCK_IN punch.
    pub clock_in: PunchRecord,
    /// The CLOCK_OUT punch, absent for an open shift.
    pub clock_out: Option<PunchRecord>,
    /// Breaks in the order taken.
    pub breaks: Vec<ShiftBreak>,
    /// Minutes from clock-in to clock-out.
    pub total_minutes: i64,
    /// Minutes of closed breaks.
    pub break_minutes: i64,
    /// Total minus break minutes.
    pub work_minutes: i64,
    /// Work minutes up to the daily threshold.
    pub regular_minutes: i64,
    /// Work minutes past the daily threshold.
    pub overtime_minutes: i64,
    /// Shop the clock-in was attributed to.
    pub shop_id: Option<String>,
    /// True once clocked out.
    pub is_complete: bool,
}

impl Shift {
    fn open(clock_in: PunchRecord) -> Self {
        Self {
            shop_id: clock_in.shop_id.clone(),
            clock_in,
            clock_out: None,
            breaks: Vec::new(),
            total_minutes: 0,
            break_minutes: 0,
            work_minutes: 0,
            regular_minutes: 0,
            overtime_minutes: 0,
            is_complete: false,
        }
    }

    fn close(&mut self, clock_out: PunchRecord, threshold_minutes: i64) {
        self.total_minutes = floor_minutes(clock_out.timestamp - self.clock_in.timestamp);
        self.break_minutes = floor_minutes(
            self.breaks
                .iter()
                .filter_map(|b| b.end.map(|end| end - b.start))
                .sum(),
        );
        self.work_minutes = (self.total_minutes - self.break_minutes).max(0);
        self.regular_minutes = self.work_minutes.min(threshold_minutes);
        self.overtime_minutes = self.work_minutes - self.regular_minutes;
        self.clock_out = Some(clock_out);
        self.is_complete = true;
    }
}

/// Minute totals over a set of shifts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetSummary {
    /// Completed shifts.
    pub total_shifts: usize,
    /// Sum of shift total minutes.
    pub total_minutes: i64,
    /// Sum of break minutes.
    pub break_minutes: i64,
    /// Sum of work minutes.
    pub work_minutes: i64,
    /// Sum of regular minutes.
    pub regular_minutes: i64,
    /// Sum of overtime minutes.
    pub overtime_minutes: i64,
    /// Work minutes per completed shift, rounded.
    pub average_shift_minutes: i64,
}

impl TimesheetSummary {
    fn of(shifts: &[Shift]) -> Self {
        let total_shifts = shifts.iter().filter(|s| s.is_complete).count();
        let work_minutes: i64 = shifts.iter().map(|s| s.work_minutes).sum();
        let average_shift_minutes = match i64::try_from(total_shifts) {
            Ok(n) if n > 0 => (2 * work_minutes + n) / (2 * n),
            _ => 0,
        };
        Self {
            total_shifts,
            total_minutes: shifts.iter().map(|s| s.total_minutes).sum(),
            break_minutes: shifts.iter().map(|s| s.break_minutes).sum(),
            work_minutes,
            regular_minutes: shifts.iter().map(|s| s.regular_minutes).sum(),
            overtime_minutes: shifts.iter().map(|s| s.overtime_minutes).sum(),
            average_shift_minutes,
        }
    }
}

/// One employee's shifts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeTimesheet {
    /// The employee.
    pub employee_id: String,
    /// Display name, if still on the roster.
    pub name: Option<String>,
    /// Job role, if still on the roster.
    pub role: Option<String>,
    /// Shifts started within the window, oldest first.
    pub shifts: Vec<Shift>,
    /// Totals over `shifts`.
    pub summary: TimesheetSummary,
}

/// Totals across every timesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetTotals {
    /// Employees with at least one punch in the window.
    pub total_employees: usize,
    /// Completed shifts.
    pub total_shifts: usize,
    /// Sum of shift total minutes.
    pub total_minutes: i64,
    /// Sum of break minutes.
    pub break_minutes: i64,
    /// Sum of work minutes.
    pub work_minutes: i64,
    /// Sum of regular minutes.
    pub regular_minutes: i64,
    /// Sum of overtime minutes.
    pub overtime_minutes: i64,
}

/// The `GET /attendance/timesheets` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timesheets {
    /// The window covered.
    pub period: TimesheetWindow,
    /// One entry per employee, by employee id.
    pub timesheets: Vec<EmployeeTimesheet>,
    /// Totals across `timesheets`.
    pub totals: TimesheetTotals,
}

/// Restricts which punches a timesheet is built from.
#[derive(Debug, Clone, Default)]
pub struct TimesheetFilter {
    /// Only this employee.
    pub employee_id: Option<String>,
    /// Only punches attributed to this shop.
    pub shop_id: Option<String>,
}

/// The daily threshold of `rule` in whole minutes, or 8 hours.
pub fn daily_threshold_minutes(rule: Option<&OvertimeRule>) -> i64 {
    rule.and_then(|r| r.daily_threshold_hours)
        .and_then(|hours| (hours * Decimal::from(60)).floor().to_i64())
        .unwrap_or(DEFAULT_DAILY_THRESHOLD_MINUTES)
}

/// Groups one employee's punches, oldest first, into shifts.
///
/// A CLOCK_IN opens a shift. Break and CLOCK_OUT punches attach to the
/// latest shift while it is open and are ignored otherwise, so a shift
/// that started before the window contributes nothing.
pub fn reconstruct_shifts(punches: &[PunchRecord], threshold_minutes: i64) -> Vec<Shift> {
    let mut shifts: Vec<Shift> = Vec::new();

    for punch in punches {
        if punch.punch_type == PunchType::ClockIn {
            shifts.push(Shift::open(punch.clone()));
            continue;
        }
        let Some(shift) = shifts.last_mut().filter(|s| !s.is_complete) else {
            continue;
        };
        match punch.punch_type {
            PunchType::ClockOut => shift.close(punch.clone(), threshold_minutes),
            PunchType::BreakStart => shift.breaks.push(ShiftBreak {
                start: punch.timestamp,
                end: None,
                duration_minutes: 0,
            }),
            PunchType::BreakEnd => {
                if let Some(open) = shift.breaks.last_mut().filter(|b| b.end.is_none()) {
                    open.end = Some(punch.timestamp);
                    open.duration_minutes = floor_minutes(punch.timestamp - open.start);
                }
            }
            PunchType::ClockIn => {}
        }
    }

    shifts
}

/// Builds timesheets for the punches in `window`.
///
/// # Errors
///
/// Returns [`AttendanceError::EmployeeNotFound`] if the filter names an
/// unknown employee.
pub async fn timesheets(
    store: &dyn AttendanceStore,
    filter: &TimesheetFilter,
    window: TimesheetWindow,
    overtime_rule: Option<&OvertimeRule>,
) -> AttendanceResult<Timesheets> {
    if let Some(employee_id) = &filter.employee_id {
        if store.employee(employee_id).await?.is_none() {
            return Err(AttendanceError::EmployeeNotFound {
                employee_id: employee_id.clone(),
            });
        }
    }

    let punches = store
        .punches(&PunchQuery {
            employee_id: filter.employee_id.clone(),
            shop_id: filter.shop_id.clone(),
            since: Some(window.start),
            until: Some(window.end),
        })
        .await?;

    let mut by_employee: BTreeMap<String, Vec<PunchRecord>> = BTreeMap::new();
    for punch in punches {
        by_employee
            .entry(punch.employee_id.clone())
            .or_default()
            .push(punch);
    }

    let threshold = daily_threshold_minutes(overtime_rule);
    let employees = store.employees().await?;
    let mut totals = TimesheetTotals::default();
    let mut sheets = Vec::with_capacity(by_employee.len());

    for (employee_id, punches) in by_employee {
        let shifts = reconstruct_shifts(&punches, threshold);
        let summary = TimesheetSummary::of(&shifts);
        totals.total_employees += 1;
        totals.total_shifts += summary.total_shifts;
        totals.total_minutes += summary.total_minutes;
        totals.break_minutes += summary.break_minutes;
        totals.work_minutes += summary.work_minutes;
        totals.regular_minutes += summary.regular_minutes;
        totals.overtime_minutes += summary.overtime_minutes;

        let employee = employees.iter().find(|e| e.id == employee_id);
        sheets.push(EmployeeTimesheet {
            name: employee.map(|e| e.name.clone()),
            role: employee.map(|e| e.role.clone()),
            employee_id,
            shifts,
            summary,
        });
    }

    debug!(
        label = %window.label,
        employees = totals.total_employees,
        shifts = totals.total_shifts,
        "Timesheets built"
    );
    Ok(Timesheets {
        period: window,
        timesheets: sheets,
        totals,
    })
}
