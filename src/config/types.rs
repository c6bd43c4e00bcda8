//! Configuration types for the attendance engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and their conversions
//! into domain models.

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calculation::BreakPolicy;
use crate::models::{
    Deduction, Employee, Geofence, GeofenceAssignment, LoanAdvance, OvertimeRule, PayPeriodKind,
    PayType, Shop, ShopAssignment,
};
use crate::store::Roster;

fn default_true() -> bool {
    true
}

/// Organization-wide settings from `organization.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationConfig {
    /// Display name of the organization.
    pub name: String,
    /// Fixed offset of local time from UTC, in minutes (e.g. -300 for UTC-5).
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// How break punches are checked.
    #[serde(default)]
    pub break_policy: BreakPolicy,
    /// Pay period used when a payroll request names none.
    #[serde(default)]
    pub default_pay_period: PayPeriodKind,
}

/// An overtime rule as written in `pay_rules.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OvertimeRuleConfig {
    /// Unique identifier for the rule.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hours per week before overtime.
    pub weekly_threshold_hours: Decimal,
    /// Hours per day before overtime, for the daily view.
    #[serde(default)]
    pub daily_threshold_hours: Option<Decimal>,
    /// Overtime rate multiplier.
    pub overtime_multiplier: Decimal,
    /// Whether the rule is in force.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Pay rules file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct PayRulesConfig {
    /// Overtime rules; the first active one is used.
    #[serde(default)]
    pub overtime_rules: Vec<OvertimeRuleConfig>,
}

/// A shop entry in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    /// Shop id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A geofence entry in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceConfig {
    /// Geofence id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning shop, if any.
    #[serde(default)]
    pub shop_id: Option<String>,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius in meters.
    pub radius_meters: f64,
    /// Whether failing containment blocks punches.
    #[serde(default)]
    pub is_required: bool,
    /// Inactive geofences are ignored.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An employee entry in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeConfig {
    /// Employee id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Job role.
    pub role: String,
    /// How `pay_rate` is interpreted.
    pub pay_type: PayType,
    /// Hourly rate, annual salary or flat amount per period.
    pub pay_rate: Decimal,
    /// Explicit overtime hourly rate.
    #[serde(default)]
    pub overtime_rate: Option<Decimal>,
    /// Argon2 PHC hash of the kiosk PIN.
    #[serde(default)]
    pub pin_hash: Option<String>,
    /// Inactive employees are kept for history.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An employee/shop membership in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopAssignmentConfig {
    /// The employee.
    pub employee_id: String,
    /// The shop.
    pub shop_id: String,
}

/// An employee/geofence override in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceAssignmentConfig {
    /// The employee.
    pub employee_id: String,
    /// The geofence.
    pub geofence_id: String,
}

/// A deduction entry in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeductionConfig {
    /// Deduction id.
    pub id: String,
    /// The employee.
    pub employee_id: String,
    /// Category code.
    #[serde(rename = "type")]
    pub deduction_type: String,
    /// Description.
    pub description: String,
    /// Flat amount per period.
    #[serde(default)]
    pub amount: Decimal,
    /// Percentage of gross pay.
    #[serde(default)]
    pub percentage: Option<Decimal>,
    /// Inactive deductions are skipped.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A loan entry in `roster.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanConfig {
    /// Loan id.
    pub id: String,
    /// The employee.
    pub employee_id: String,
    /// Description.
    pub description: String,
    /// Installment per period.
    pub period_payment: Decimal,
    /// Outstanding balance.
    pub remaining_balance: Decimal,
    /// Inactive loans are skipped.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Roster file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Shops.
    pub shops: Vec<ShopConfig>,
    /// Geofences.
    pub geofences: Vec<GeofenceConfig>,
    /// Employees.
    pub employees: Vec<EmployeeConfig>,
    /// Shop memberships.
    pub shop_assignments: Vec<ShopAssignmentConfig>,
    /// Geofence overrides.
    pub geofence_assignments: Vec<GeofenceAssignmentConfig>,
    /// Deductions.
    pub deductions: Vec<DeductionConfig>,
    /// Loans.
    pub loans: Vec<LoanConfig>,
}

impl From<OvertimeRuleConfig> for OvertimeRule {
    fn from(c: OvertimeRuleConfig) -> Self {
        OvertimeRule {
            id: c.id,
            name: c.name,
            weekly_threshold_hours: c.weekly_threshold_hours,
            daily_threshold_hours: c.daily_threshold_hours,
            overtime_multiplier: c.overtime_multiplier,
            is_active: c.is_active,
        }
    }
}

impl From<RosterConfig> for Roster {
    fn from(c: RosterConfig) -> Self {
        Roster {
            shops: c
                .shops
                .into_iter()
                .map(|s| Shop {
                    id: s.id,
                    name: s.name,
                })
                .collect(),
            geofences: c
                .geofences
                .into_iter()
                .map(|g| Geofence {
                    id: g.id,
                    name: g.name,
                    shop_id: g.shop_id,
                    latitude: g.latitude,
                    longitude: g.longitude,
                    radius_meters: g.radius_meters,
                    is_required: g.is_required,
                    is_active: g.is_active,
                })
                .collect(),
            employees: c
                .employees
                .into_iter()
                .map(|e| Employee {
                    id: e.id,
                    name: e.name,
                    role: e.role,
                    pay_type: e.pay_type,
                    pay_rate: e.pay_rate,
                    overtime_rate: e.overtime_rate,
                    pin_hash: e.pin_hash,
                    is_active: e.is_active,
                })
                .collect(),
            shop_assignments: c
                .shop_assignments
                .into_iter()
                .map(|a| ShopAssignment {
                    employee_id: a.employee_id,
                    shop_id: a.shop_id,
                })
                .collect(),
            geofence_assignments: c
                .geofence_assignments
                .into_iter()
                .map(|a| GeofenceAssignment {
                    employee_id: a.employee_id,
                    geofence_id: a.geofence_id,
                })
                .collect(),
            deductions: c
                .deductions
                .into_iter()
                .map(|d| Deduction {
                    id: d.id,
                    employee_id: d.employee_id,
                    deduction_type: d.deduction_type,
                    description: d.description,
                    amount: d.amount,
                    percentage: d.percentage,
                    is_active: d.is_active,
                })
                .collect(),
            loans: c
                .loans
                .into_iter()
                .map(|l| LoanAdvance {
                    id: l.id,
                    employee_id: l.employee_id,
                    description: l.description,
                    period_payment: l.period_payment,
                    remaining_balance: l.remaining_balance,
                    is_active: l.is_active,
                })
                .collect(),
        }
    }
}

/// The complete attendance configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    organization: OrganizationConfig,
    utc_offset: FixedOffset,
    overtime_rules: Vec<OvertimeRule>,
    roster: Roster,
}

impl AttendanceConfig {
    /// Creates a configuration from its parts.
    ///
    /// Returns `None` if the UTC offset is outside ±24 hours.
    pub fn new(
        organization: OrganizationConfig,
        overtime_rules: Vec<OvertimeRule>,
        roster: Roster,
    ) -> Option<Self> {
        let utc_offset = FixedOffset::east_opt(organization.utc_offset_minutes.checked_mul(60)?)?;
        Some(Self {
            organization,
            utc_offset,
            overtime_rules,
            roster,
        })
    }

    /// Returns the organization settings.
    pub fn organization(&self) -> &OrganizationConfig {
        &self.organization
    }

    /// Returns the organization's fixed UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Returns all overtime rules.
    pub fn overtime_rules(&self) -> &[OvertimeRule] {
        &self.overtime_rules
    }

    /// Returns the roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}
