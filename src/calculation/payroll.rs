//! Gross-to-net payroll calculation.
//!
//! [`calculate_pay`] turns aggregated hours into pay for one employee and
//! period, applying the active overtime rule, recurring deductions and loan
//! installments. Every decision is recorded as an [`AuditStep`].
//! [`daily_breakdown`] produces the indicative per-day view.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;

use super::interval_aggregation::daily_work;
use super::overtime_split::{period_threshold, round_2dp, split_hours};
use crate::models::{
    AuditStep, DEFAULT_OVERTIME_MULTIPLIER, DailyBreakdownEntry, Deduction, DeductionLine,
    Employee, LoanAdvance, OvertimeRule, PayCalculation, PayPeriodKind, PayType, PunchRecord,
};

/// Standard full-time hours per year used to derive an hourly rate from a salary.
pub const ANNUAL_WORK_HOURS: Decimal = Decimal::from_parts(2080, 0, 0, false, 0);

/// Deduction type used for loan installments in the breakdown.
pub const LOAN_REPAYMENT_TYPE: &str = "LOAN_REPAYMENT";

/// Everything needed to compute one employee's pay for one period.
#[derive(Debug, Clone, Copy)]
pub struct PayInputs<'a> {
    /// The employee being paid.
    pub employee: &'a Employee,
    /// Total hours aggregated from punches, unrounded.
    pub total_hours: Decimal,
    /// The tenant's overtime rule, if any.
    pub overtime_rule: Option<&'a OvertimeRule>,
    /// The employee's deductions; inactive ones are skipped.
    pub deductions: &'a [Deduction],
    /// The employee's loans; inactive ones are skipped.
    pub loans: &'a [LoanAdvance],
    /// The pay period length.
    pub period: PayPeriodKind,
}

/// Returns the overtime multiplier of the active rule, or 1.5.
pub fn overtime_multiplier(rule: Option<&OvertimeRule>) -> Decimal {
    rule.filter(|r| r.is_active)
        .map(|r| r.overtime_multiplier)
        .unwrap_or(DEFAULT_OVERTIME_MULTIPLIER)
}

/// Returns the hourly rate regular hours are valued at.
///
/// Salaries are converted over 2080 hours a year; flat-rate employees have
/// no hourly value.
pub fn base_hourly_rate(employee: &Employee) -> Decimal {
    match employee.pay_type {
        PayType::Hourly => employee.pay_rate,
        PayType::Salary => employee.pay_rate / ANNUAL_WORK_HOURS,
        PayType::FlatRate => Decimal::ZERO,
    }
}

/// Returns the hourly rate overtime hours are paid at.
///
/// An explicit overtime rate on the employee wins over the multiplier.
pub fn overtime_hourly_rate(employee: &Employee, multiplier: Decimal) -> Decimal {
    match employee.pay_type {
        PayType::FlatRate => Decimal::ZERO,
        PayType::Hourly | PayType::Salary => employee
            .overtime_rate
            .unwrap_or_else(|| base_hourly_rate(employee) * multiplier),
    }
}

/// Calculates gross-to-net pay.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{calculate_pay, PayInputs};
/// use attendance_engine::models::{Employee, OvertimeRule, PayPeriodKind, PayType};
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: "Alex Rivera".to_string(),
///     role: "MECHANIC".to_string(),
///     pay_type: PayType::Hourly,
///     pay_rate: Decimal::new(20, 0),
///     overtime_rate: None,
///     pin_hash: None,
///     is_active: true,
/// };
/// let rule = OvertimeRule {
///     id: "ot".to_string(),
///     name: "Weekly overtime".to_string(),
///     weekly_threshold_hours: Decimal::new(40, 0),
///     daily_threshold_hours: None,
///     overtime_multiplier: Decimal::new(15, 1),
///     is_active: true,
/// };
///
/// let pay = calculate_pay(&PayInputs {
///     employee: &employee,
///     total_hours: Decimal::new(45, 0),
///     overtime_rule: Some(&rule),
///     deductions: &[],
///     loans: &[],
///     period: PayPeriodKind::Week,
/// });
///
/// assert_eq!(pay.regular_pay, Decimal::new(800, 0));
/// assert_eq!(pay.overtime_pay, Decimal::new(150, 0));
/// assert_eq!(pay.gross_pay, Decimal::new(950, 0));
/// ```
pub fn calculate_pay(inputs: &PayInputs<'_>) -> PayCalculation {
    let employee = inputs.employee;
    let mut audit_steps: Vec<AuditStep> = Vec::new();

    // Step 1: split hours against the period threshold
    let threshold = period_threshold(inputs.overtime_rule, inputs.period.weeks_in_period());
    let split = split_hours(inputs.total_hours, threshold, 1);
    let regular_hours = split.regular_hours;
    let overtime_hours = split.overtime_hours;
    audit_steps.push(split.audit_step);

    // Step 2: value the hours according to pay type
    let multiplier = overtime_multiplier(inputs.overtime_rule);
    let overtime_rate = overtime_hourly_rate(employee, multiplier);
    let (regular_pay, overtime_pay, reasoning) = match employee.pay_type {
        PayType::Hourly => (
            regular_hours * employee.pay_rate,
            overtime_hours * overtime_rate,
            format!(
                "{} regular hours at {} plus {} overtime hours at {}",
                regular_hours.normalize(),
                employee.pay_rate.normalize(),
                overtime_hours.normalize(),
                round_2dp(overtime_rate).normalize()
            ),
        ),
        PayType::Salary => {
            let periods = inputs.period.periods_per_year();
            (
                employee.pay_rate / Decimal::from(periods),
                overtime_hours * overtime_rate,
                format!(
                    "Annual salary {} over {} periods plus {} overtime hours at {}",
                    employee.pay_rate.normalize(),
                    periods,
                    overtime_hours.normalize(),
                    round_2dp(overtime_rate).normalize()
                ),
            )
        }
        PayType::FlatRate => (
            employee.pay_rate,
            Decimal::ZERO,
            format!(
                "Flat rate {} per period, overtime not paid",
                employee.pay_rate.normalize()
            ),
        ),
    };
    let regular_pay = round_2dp(regular_pay);
    let overtime_pay = round_2dp(overtime_pay);
    let gross_pay = round_2dp(regular_pay + overtime_pay);
    audit_steps.push(AuditStep {
        step_number: 2,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "pay_type": employee.pay_type,
            "pay_rate": employee.pay_rate.normalize().to_string(),
            "multiplier": multiplier.normalize().to_string(),
        }),
        output: serde_json::json!({
            "regular_pay": regular_pay.to_string(),
            "overtime_pay": overtime_pay.to_string(),
            "gross_pay": gross_pay.to_string(),
        }),
        reasoning,
    });

    // Step 3: deductions, capped at gross pay
    let mut deduction_breakdown: Vec<DeductionLine> = Vec::new();
    let mut requested = Decimal::ZERO;
    for deduction in inputs.deductions.iter().filter(|d| d.is_active) {
        let amount = round_2dp(deduction.amount_for(gross_pay));
        requested += amount;
        deduction_breakdown.push(DeductionLine {
            id: deduction.id.clone(),
            deduction_type: deduction.deduction_type.clone(),
            description: deduction.description.clone(),
            amount,
        });
    }
    let total_deductions = round_2dp(requested.min(gross_pay));
    audit_steps.push(AuditStep {
        step_number: 3,
        rule_id: "deductions".to_string(),
        rule_name: "Deductions".to_string(),
        input: serde_json::json!({
            "count": deduction_breakdown.len(),
            "requested": requested.to_string(),
        }),
        output: serde_json::json!({ "total_deductions": total_deductions.to_string() }),
        reasoning: if requested > gross_pay {
            format!(
                "Deductions of {} capped at gross pay {}",
                requested, gross_pay
            )
        } else {
            format!("{} active deductions total {}", deduction_breakdown.len(), total_deductions)
        },
    });

    // Step 4: loan installments
    let mut loan_repayments = Decimal::ZERO;
    for loan in inputs.loans.iter().filter(|l| l.is_active) {
        let installment = round_2dp(loan.installment());
        if installment > Decimal::ZERO {
            loan_repayments += installment;
            deduction_breakdown.push(DeductionLine {
                id: loan.id.clone(),
                deduction_type: LOAN_REPAYMENT_TYPE.to_string(),
                description: loan.description.clone(),
                amount: installment,
            });
        }
    }
    let loan_repayments = round_2dp(loan_repayments);

    // Step 5: net pay, never negative
    let net_pay = round_2dp((gross_pay - total_deductions - loan_repayments).max(Decimal::ZERO));
    audit_steps.push(AuditStep {
        step_number: 4,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "total_deductions": total_deductions.to_string(),
            "loan_repayments": loan_repayments.to_string(),
        }),
        output: serde_json::json!({ "net_pay": net_pay.to_string() }),
        reasoning: format!(
            "{} gross less {} deductions and {} loan repayments",
            gross_pay, total_deductions, loan_repayments
        ),
    });

    PayCalculation {
        regular_hours,
        overtime_hours,
        regular_pay,
        overtime_pay,
        gross_pay,
        total_deductions,
        loan_repayments,
        net_pay,
        deduction_breakdown,
        audit_steps,
    }
}

/// Builds the per-day payroll view.
///
/// Each organization-local day is split by the rule's daily threshold (all
/// hours regular without one) and valued at the employee's hourly rates.
/// Rows are indicative and need not add up to the period result.
pub fn daily_breakdown(
    punches: &[PunchRecord],
    now: DateTime<Utc>,
    offset: FixedOffset,
    employee: &Employee,
    overtime_rule: Option<&OvertimeRule>,
) -> Vec<DailyBreakdownEntry> {
    let daily_threshold = overtime_rule
        .filter(|r| r.is_active)
        .and_then(|r| r.daily_threshold_hours);
    let regular_rate = base_hourly_rate(employee);
    let overtime_rate = overtime_hourly_rate(employee, overtime_multiplier(overtime_rule));

    daily_work(punches, now, offset)
        .into_iter()
        .map(|day| {
            let split = split_hours(day.hours, daily_threshold, 1);
            DailyBreakdownEntry {
                date: day.date,
                clock_in: day.first_clock_in,
                clock_out: day.last_clock_out,
                pay: round_2dp(
                    split.regular_hours * regular_rate + split.overtime_hours * overtime_rate,
                ),
                regular_hours: split.regular_hours,
                overtime_hours: split.overtime_hours,
            }
        })
        .collect()
}
