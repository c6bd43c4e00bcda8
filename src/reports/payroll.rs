//! Payroll reports for one employee or a whole shop.

use std::time::Instant;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculation::{PayInputs, aggregate_hours, calculate_pay, daily_breakdown, round_2dp};
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{
    Employee, EmployeePayroll, EmployeePayrollReport, OvertimeRule, PayPeriod, PayPeriodKind,
    PayrollReport, PayrollTotals, PunchRecord,
};
use crate::store::{AttendanceStore, PunchQuery};

/// Settings shared by every payroll report.
#[derive(Debug, Clone, Copy)]
pub struct PayrollContext<'a> {
    /// The tenant's active overtime rule.
    pub overtime_rule: Option<&'a OvertimeRule>,
    /// Organization time zone.
    pub offset: FixedOffset,
    /// The report instant; open shifts are counted up to here.
    pub now: DateTime<Utc>,
    /// Period length.
    pub kind: PayPeriodKind,
}

impl PayrollContext<'_> {
    /// The period containing `now`.
    pub fn period(&self) -> PayPeriod {
        PayPeriod::containing(self.kind, self.now, self.offset)
    }
}

async fn period_punches(
    store: &dyn AttendanceStore,
    employee_id: &str,
    period: &PayPeriod,
) -> AttendanceResult<Vec<PunchRecord>> {
    store
        .punches(&PunchQuery {
            employee_id: Some(employee_id.to_string()),
            since: Some(period.start),
            ..PunchQuery::default()
        })
        .await
}

async fn payroll_for(
    store: &dyn AttendanceStore,
    employee: &Employee,
    punches: &[PunchRecord],
    ctx: &PayrollContext<'_>,
) -> AttendanceResult<EmployeePayroll> {
    let deductions = store.deductions_for(&employee.id).await?;
    let loans = store.loans_for(&employee.id).await?;
    let total_hours = aggregate_hours(punches, ctx.now);

    let pay = calculate_pay(&PayInputs {
        employee,
        total_hours,
        overtime_rule: ctx.overtime_rule,
        deductions: &deductions,
        loans: &loans,
        period: ctx.kind,
    });

    Ok(EmployeePayroll {
        employee_id: employee.id.clone(),
        name: employee.name.clone(),
        role: employee.role.clone(),
        pay_type: employee.pay_type,
        pay_rate: employee.pay_rate,
        total_hours: round_2dp(total_hours),
        pay,
    })
}

/// Computes one employee's payroll for the current period.
pub async fn employee_payroll(
    store: &dyn AttendanceStore,
    employee: &Employee,
    ctx: &PayrollContext<'_>,
) -> AttendanceResult<EmployeePayroll> {
    let punches = period_punches(store, &employee.id, &ctx.period()).await?;
    payroll_for(store, employee, &punches, ctx).await
}

/// Computes one employee's payroll with the per-day view.
///
/// # Errors
///
/// Returns [`AttendanceError::EmployeeNotFound`] for an unknown employee.
pub async fn employee_payroll_report(
    store: &dyn AttendanceStore,
    employee_id: &str,
    ctx: &PayrollContext<'_>,
) -> AttendanceResult<EmployeePayrollReport> {
    let employee =
        store
            .employee(employee_id)
            .await?
            .ok_or_else(|| AttendanceError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })?;

    let period = ctx.period();
    let punches = period_punches(store, employee_id, &period).await?;
    let payroll = payroll_for(store, &employee, &punches, ctx).await?;
    let daily = daily_breakdown(&punches, ctx.now, ctx.offset, &employee, ctx.overtime_rule);

    debug!(
        employee_id = %employee_id,
        punches = punches.len(),
        days = daily.len(),
        "Employee payroll computed"
    );

    Ok(EmployeePayrollReport {
        calculation_id: Uuid::new_v4(),
        period,
        generated_at: ctx.now,
        payroll,
        daily_breakdown: daily,
    })
}

/// Computes payroll for every active employee.
pub async fn shop_payroll(
    store: &dyn AttendanceStore,
    ctx: &PayrollContext<'_>,
) -> AttendanceResult<PayrollReport> {
    let start = Instant::now();
    let period = ctx.period();

    let mut totals = PayrollTotals::default();
    let mut employees = Vec::new();
    for employee in store.employees().await?.iter().filter(|e| e.is_active) {
        let punches = period_punches(store, &employee.id, &period).await?;
        let payroll = payroll_for(store, employee, &punches, ctx).await?;
        totals.add(&payroll);
        employees.push(payroll);
    }

    totals.gross_pay = round_2dp(totals.gross_pay);
    totals.total_deductions = round_2dp(totals.total_deductions);
    totals.loan_repayments = round_2dp(totals.loan_repayments);
    totals.net_pay = round_2dp(totals.net_pay);
    totals.regular_hours = round_2dp(totals.regular_hours);
    totals.overtime_hours = round_2dp(totals.overtime_hours);

    let duration_us = start.elapsed().as_micros() as u64;
    info!(
        employees = totals.employee_count,
        gross_pay = %totals.gross_pay,
        net_pay = %totals.net_pay,
        duration_us,
        "Shop payroll computed"
    );

    Ok(PayrollReport {
        calculation_id: Uuid::new_v4(),
        period,
        generated_at: ctx.now,
        totals,
        employees,
        duration_us,
    })
}
