//! Regular/overtime hour splitting.
//!
//! This module splits aggregated hours into regular and overtime portions
//! against a threshold, for both the period (weekly threshold scaled by the
//! weeks in the period) and single days (daily threshold).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, OvertimeRule};

/// The result of splitting hours against an overtime threshold.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::split_hours;
/// use rust_decimal::Decimal;
///
/// let split = split_hours(Decimal::new(45, 0), Some(Decimal::new(40, 0)), 1);
/// assert_eq!(split.regular_hours, Decimal::new(40, 0));
/// assert_eq!(split.overtime_hours, Decimal::new(5, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeSplit {
    /// Hours up to the threshold, rounded to 2 decimal places.
    pub regular_hours: Decimal,
    /// Hours over the threshold, rounded to 2 decimal places.
    pub overtime_hours: Decimal,
    /// The audit step recording this split.
    pub audit_step: AuditStep,
}

/// Rounds hours or money to 2 decimal places, midpoint away from zero.
pub fn round_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the period threshold of `rule`: weekly threshold times `weeks`.
///
/// Inactive or missing rules yield no threshold.
pub fn period_threshold(rule: Option<&OvertimeRule>, weeks: u32) -> Option<Decimal> {
    rule.filter(|r| r.is_active)
        .map(|r| r.weekly_threshold_hours * Decimal::from(weeks))
}

/// Splits `worked_hours` into regular and overtime hours.
///
/// Without a threshold every hour is regular. Both parts are rounded to
/// 2 decimal places after the split.
///
/// # Examples
///
/// ## Exactly at the threshold
///
/// ```
/// use attendance_engine::calculation::split_hours;
/// use rust_decimal::Decimal;
///
/// let split = split_hours(Decimal::new(40, 0), Some(Decimal::new(40, 0)), 1);
/// assert_eq!(split.overtime_hours, Decimal::ZERO);
/// ```
///
/// ## No overtime rule
///
/// ```
/// use attendance_engine::calculation::split_hours;
/// use rust_decimal::Decimal;
///
/// let split = split_hours(Decimal::new(60, 0), None, 1);
/// assert_eq!(split.regular_hours, Decimal::new(60, 0));
/// assert_eq!(split.overtime_hours, Decimal::ZERO);
/// ```
pub fn split_hours(
    worked_hours: Decimal,
    threshold: Option<Decimal>,
    step_number: u32,
) -> OvertimeSplit {
    let worked_hours = worked_hours.max(Decimal::ZERO);

    let (regular, overtime) = match threshold {
        Some(threshold) => (
            worked_hours.min(threshold),
            (worked_hours - threshold).max(Decimal::ZERO),
        ),
        None => (worked_hours, Decimal::ZERO),
    };
    let regular_hours = round_2dp(regular);
    let overtime_hours = round_2dp(overtime);

    let reasoning = match threshold {
        None => format!(
            "No active overtime rule, all {} hours are regular",
            worked_hours.round_dp(2).normalize()
        ),
        Some(threshold) if overtime_hours > Decimal::ZERO => format!(
            "{} hours worked exceeds {} hour threshold by {} hours, triggering overtime",
            worked_hours.round_dp(2).normalize(),
            threshold.normalize(),
            overtime_hours.normalize()
        ),
        Some(threshold) if worked_hours == threshold => format!(
            "{} hours worked equals {} hour threshold, no overtime triggered",
            worked_hours.normalize(),
            threshold.normalize()
        ),
        Some(threshold) => format!(
            "{} hours worked is under {} hour threshold, no overtime triggered",
            worked_hours.round_dp(2).normalize(),
            threshold.normalize()
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_split".to_string(),
        rule_name: "Overtime Split".to_string(),
        input: serde_json::json!({
            "worked_hours": worked_hours.round_dp(4).normalize().to_string(),
            "threshold": threshold.map(|t| t.normalize().to_string()),
        }),
        output: serde_json::json!({
            "regular_hours": regular_hours.normalize().to_string(),
            "overtime_hours": overtime_hours.normalize().to_string(),
        }),
        reasoning,
    };

    OvertimeSplit {
        regular_hours,
        overtime_hours,
        audit_step,
    }
}
