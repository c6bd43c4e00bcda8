//! Employee model and related types.
//!
//! This module defines the Employee struct and PayType enum
//! for representing the workers whose punches are recorded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an employee's pay rate is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayType {
    /// `pay_rate` is an hourly rate.
    Hourly,
    /// `pay_rate` is a fixed amount per pay period; no overtime.
    FlatRate,
    /// `pay_rate` is an annual salary.
    Salary,
}

/// Represents an employee who punches in and out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Job role (e.g. "MECHANIC").
    pub role: String,
    /// How `pay_rate` is interpreted.
    pub pay_type: PayType,
    /// Hourly rate, per-period flat amount or annual salary depending on `pay_type`.
    pub pay_rate: Decimal,
    /// Explicit overtime hourly rate overriding the rule multiplier.
    #[serde(default)]
    pub overtime_rate: Option<Decimal>,
    /// Argon2 PHC hash of the kiosk PIN.
    #[serde(default, skip_serializing)]
    pub pin_hash: Option<String>,
    /// Whether the employee is currently employed.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    /// Returns true if the employee is paid by the hour.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::{Employee, PayType};
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     name: "Alex Rivera".to_string(),
    ///     role: "MECHANIC".to_string(),
    ///     pay_type: PayType::Hourly,
    ///     pay_rate: Decimal::new(2000, 2),
    ///     overtime_rate: None,
    ///     pin_hash: None,
    ///     is_active: true,
    /// };
    /// assert!(employee.is_hourly());
    /// ```
    pub fn is_hourly(&self) -> bool {
        self.pay_type == PayType::Hourly
    }
}
