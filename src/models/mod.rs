//! Core data models for the attendance engine.
//!
//! This module contains all the domain models used throughout the engine.

mod employee;
mod geofence;
mod pay_period;
mod pay_rules;
mod payroll_result;
mod punch;

pub use employee::{Employee, PayType};
pub use geofence::{Geofence, GeofenceAssignment, Shop, ShopAssignment};
pub use pay_period::{PayPeriod, PayPeriodKind, local_midnight};
pub use pay_rules::{DEFAULT_OVERTIME_MULTIPLIER, Deduction, LoanAdvance, OvertimeRule};
pub use payroll_result::{
    AuditStep, DailyBreakdownEntry, DeductionLine, EmployeePayroll, EmployeePayrollReport,
    PayCalculation, PayrollReport, PayrollTotals,
};
pub use punch::{GeoPoint, PunchMethod, PunchRecord, PunchType};
