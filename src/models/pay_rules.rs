//! Pay rule models: overtime rules, deductions and loan advances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default overtime multiplier applied when no rule is active.
pub const DEFAULT_OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Thresholds and multiplier for overtime.
///
/// At most one active rule is consulted per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Display name of the rule.
    pub name: String,
    /// Hours per week before overtime starts.
    pub weekly_threshold_hours: Decimal,
    /// Hours per day before overtime starts (daily breakdown only).
    pub daily_threshold_hours: Option<Decimal>,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub overtime_multiplier: Decimal,
    /// Whether this rule is in force.
    pub is_active: bool,
}

/// A recurring deduction from gross pay.
///
/// A deduction with a positive `percentage` is computed as that percentage
/// of gross pay; otherwise the flat `amount` applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    /// Unique identifier for the deduction.
    pub id: String,
    /// The employee the deduction applies to.
    pub employee_id: String,
    /// Category code (e.g. "UNIFORM", "RETIREMENT").
    pub deduction_type: String,
    /// Human-readable description.
    pub description: String,
    /// Flat amount per pay period.
    pub amount: Decimal,
    /// Percentage of gross pay, overriding `amount` when positive.
    #[serde(default)]
    pub percentage: Option<Decimal>,
    /// Inactive deductions are skipped.
    pub is_active: bool,
}

impl Deduction {
    /// Returns the amount this deduction takes from the given gross pay.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::Deduction;
    /// use rust_decimal::Decimal;
    ///
    /// let retirement = Deduction {
    ///     id: "ded_1".to_string(),
    ///     employee_id: "emp_001".to_string(),
    ///     deduction_type: "RETIREMENT".to_string(),
    ///     description: "401k".to_string(),
    ///     amount: Decimal::ZERO,
    ///     percentage: Some(Decimal::new(5, 0)),
    ///     is_active: true,
    /// };
    /// assert_eq!(retirement.amount_for(Decimal::new(1000, 0)), Decimal::new(50, 0));
    /// ```
    pub fn amount_for(&self, gross_pay: Decimal) -> Decimal {
        match self.percentage {
            Some(percentage) if percentage > Decimal::ZERO => {
                gross_pay * percentage / Decimal::ONE_HUNDRED
            }
            _ => self.amount,
        }
    }
}

/// An amortizing loan or pay advance repaid through payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAdvance {
    /// Unique identifier for the loan.
    pub id: String,
    /// The borrowing employee.
    pub employee_id: String,
    /// Human-readable description.
    pub description: String,
    /// Scheduled installment per pay period.
    pub period_payment: Decimal,
    /// Outstanding balance.
    pub remaining_balance: Decimal,
    /// Inactive loans are skipped.
    pub is_active: bool,
}

impl LoanAdvance {
    /// Returns this period's installment, capped at the remaining balance.
    pub fn installment(&self) -> Decimal {
        self.period_payment
            .min(self.remaining_balance)
            .max(Decimal::ZERO)
    }
}
