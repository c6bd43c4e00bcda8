//! Read-side reports built from stored punches: status, history, timesheets
//! and payroll.
//!
//! Reports never mutate the store. They derive state and hours with the
//! pure functions in [`crate::calculation`] and shape the result for the
//! HTTP layer.

mod attendance;
mod payroll;
mod timesheets;

pub use attendance::{
    CurrentShift, EmployeeStatus, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT, REVIEW_DEFAULT_DAYS,
    REVIEW_MAX_ENTRIES, ReviewEntry, ReviewFlags, ReviewPeriod, ReviewQueue, ReviewSummary,
    WhosWorking, WorkingEmployee, employee_status, format_minutes, punch_history, review_queue,
    whos_working,
};
pub use payroll::{PayrollContext, employee_payroll, employee_payroll_report, shop_payroll};
pub use timesheets::{
    DEFAULT_DAILY_THRESHOLD_MINUTES, EmployeeTimesheet, Shift, ShiftBreak, TimesheetFilter,
    TimesheetPeriod, TimesheetSummary, TimesheetTotals, TimesheetWindow, Timesheets,
    daily_threshold_minutes, reconstruct_shifts, timesheets,
};
