//! Payroll result models.
//!
//! This module contains the [`PayCalculation`] type and its associated
//! structures that capture the outputs of a payroll run: the hours split,
//! gross-to-net amounts, the deduction breakdown, the per-day view and an
//! audit trace of every rule that was applied.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PayPeriod, PayType};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use attendance_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "overtime_split".to_string(),
///     rule_name: "Overtime Split".to_string(),
///     input: serde_json::json!({"worked_hours": "45", "threshold": "40"}),
///     output: serde_json::json!({"regular_hours": "40", "overtime_hours": "5"}),
///     reasoning: "45 hours worked exceeds 40 hour threshold by 5 hours".to_string(),
/// };
/// assert_eq!(step.step_number, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// One applied deduction or loan installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionLine {
    /// The deduction or loan id.
    pub id: String,
    /// Category code; loans use `LOAN_REPAYMENT`.
    #[serde(rename = "type")]
    pub deduction_type: String,
    /// Human-readable description.
    pub description: String,
    /// Amount taken this period.
    pub amount: Decimal,
}

/// Gross-to-net pay for one employee and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayCalculation {
    /// Regular hours paid.
    pub regular_hours: Decimal,
    /// Overtime hours paid.
    pub overtime_hours: Decimal,
    /// Pay for regular hours.
    pub regular_pay: Decimal,
    /// Pay for overtime hours.
    pub overtime_pay: Decimal,
    /// Regular plus overtime pay.
    pub gross_pay: Decimal,
    /// Sum of applied deductions, never more than gross pay.
    pub total_deductions: Decimal,
    /// Sum of loan installments.
    pub loan_repayments: Decimal,
    /// Gross pay less deductions and loan repayments, floored at zero.
    pub net_pay: Decimal,
    /// Every applied deduction and loan installment.
    pub deduction_breakdown: Vec<DeductionLine>,
    /// Rules applied while computing this result.
    pub audit_steps: Vec<AuditStep>,
}

/// One row of the per-day payroll view.
///
/// Uses the rule's daily threshold, so rows do not necessarily add up to
/// the period's weekly-threshold split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdownEntry {
    /// Organization-local calendar day.
    pub date: NaiveDate,
    /// First clock-in of the day.
    pub clock_in: Option<DateTime<Utc>>,
    /// Last clock-out of the day.
    pub clock_out: Option<DateTime<Utc>>,
    /// Hours up to the daily threshold.
    pub regular_hours: Decimal,
    /// Hours over the daily threshold.
    pub overtime_hours: Decimal,
    /// Indicative pay for the day.
    pub pay: Decimal,
}

/// Payroll for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayroll {
    /// The employee id.
    pub employee_id: String,
    /// Employee display name.
    pub name: String,
    /// Employee role.
    pub role: String,
    /// How the pay rate is interpreted.
    pub pay_type: PayType,
    /// The employee's pay rate.
    pub pay_rate: Decimal,
    /// Total hours aggregated from punches, before the overtime split.
    pub total_hours: Decimal,
    /// Gross-to-net result.
    pub pay: PayCalculation,
}

/// Per-employee payroll with its daily view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayrollReport {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// The period the report covers.
    pub period: PayPeriod,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// The employee's payroll.
    pub payroll: EmployeePayroll,
    /// Per-day view using the daily threshold.
    pub daily_breakdown: Vec<DailyBreakdownEntry>,
}

/// Aggregated totals across a shop-wide payroll run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollTotals {
    /// Number of employees included.
    pub employee_count: usize,
    /// Sum of gross pay.
    pub gross_pay: Decimal,
    /// Sum of deductions.
    pub total_deductions: Decimal,
    /// Sum of loan repayments.
    pub loan_repayments: Decimal,
    /// Sum of net pay.
    pub net_pay: Decimal,
    /// Sum of regular hours.
    pub regular_hours: Decimal,
    /// Sum of overtime hours.
    pub overtime_hours: Decimal,
}

impl PayrollTotals {
    /// Adds one employee's result to the running totals.
    pub fn add(&mut self, payroll: &EmployeePayroll) {
        self.employee_count += 1;
        self.gross_pay += payroll.pay.gross_pay;
        self.total_deductions += payroll.pay.total_deductions;
        self.loan_repayments += payroll.pay.loan_repayments;
        self.net_pay += payroll.pay.net_pay;
        self.regular_hours += payroll.pay.regular_hours;
        self.overtime_hours += payroll.pay.overtime_hours;
    }
}

/// Shop-wide payroll for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollReport {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// The period the report covers.
    pub period: PayPeriod,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Totals across all employees.
    pub totals: PayrollTotals,
    /// One entry per employee.
    pub employees: Vec<EmployeePayroll>,
    /// Calculation duration in microseconds.
    pub duration_us: u64,
}
