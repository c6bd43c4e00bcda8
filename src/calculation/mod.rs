//! Calculation logic for the attendance engine.
//!
//! This module contains the pure, synchronous computations everything else
//! builds on: geofence distance and containment, the derived attendance
//! state machine, worked-time reconstruction from punch streams, the
//! regular/overtime split and gross-to-net payroll.

mod geofence;
mod interval_aggregation;
mod overtime_split;
mod payroll;
mod punch_state;

pub use geofence::{
    EARTH_RADIUS_METERS, GeofenceMatch, GeofenceResolution, collect_candidates,
    haversine_distance, resolve_geofence,
};
pub use interval_aggregation::{
    DayWork, WorkInterval, aggregate_hours, break_duration_since, daily_work, duration_hours,
    work_intervals, worked_duration,
};
pub use overtime_split::{OvertimeSplit, period_threshold, round_2dp, split_hours};
pub use payroll::{
    ANNUAL_WORK_HOURS, LOAN_REPAYMENT_TYPE, PayInputs, base_hourly_rate, calculate_pay,
    daily_breakdown, overtime_hourly_rate, overtime_multiplier,
};
pub use punch_state::{
    AttendanceState, BreakPolicy, chronological_order, derive_state, sort_chronologically,
    validate_transition,
};
