//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! organization, pay rules and roster from YAML files.

use chrono::FixedOffset;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::calculation::BreakPolicy;
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{OvertimeRule, PayPeriodKind};
use crate::store::Roster;

use super::types::{AttendanceConfig, OrganizationConfig, PayRulesConfig, RosterConfig};

/// Loads and provides access to the attendance configuration.
///
/// # Directory Structure
///
/// ```text
/// config/shop/
/// ├── organization.yaml   # Name, UTC offset, break policy, default pay period
/// ├── pay_rules.yaml      # Overtime rules
/// └── roster.yaml         # Shops, geofences, employees, assignments, deductions, loans
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/shop")?;
/// println!("Loaded organization: {}", loader.organization().name);
/// # Ok::<(), attendance_engine::error::AttendanceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AttendanceConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// - [`AttendanceError::ConfigNotFound`] if a file is missing
    /// - [`AttendanceError::ConfigParseError`] if a file is not valid YAML,
    ///   a required field is missing, the UTC offset is out of range, a
    ///   geofence radius is not positive, a roster id is duplicated or a
    ///   roster entry references an unknown shop, geofence or employee
    pub fn load<P: AsRef<Path>>(path: P) -> AttendanceResult<Self> {
        let path = path.as_ref();

        let organization_path = path.join("organization.yaml");
        let organization = Self::load_yaml::<OrganizationConfig>(&organization_path)?;

        let pay_rules = Self::load_yaml::<PayRulesConfig>(&path.join("pay_rules.yaml"))?;

        let roster_path = path.join("roster.yaml");
        let roster = Self::load_yaml::<RosterConfig>(&roster_path)?;

        Self::validate_roster(&roster).map_err(|message| AttendanceError::ConfigParseError {
            path: roster_path.display().to_string(),
            message,
        })?;

        let utc_offset_minutes = organization.utc_offset_minutes;
        let config = AttendanceConfig::new(
            organization,
            pay_rules.overtime_rules.into_iter().map(Into::into).collect(),
            roster.into(),
        )
        .ok_or_else(|| AttendanceError::ConfigParseError {
            path: organization_path.display().to_string(),
            message: format!("utc_offset_minutes {} is out of range", utc_offset_minutes),
        })?;

        Ok(Self { config })
    }

    /// Checks geofence radii, id uniqueness and that every reference names
    /// a known shop, geofence or employee.
    fn validate_roster(roster: &RosterConfig) -> Result<(), String> {
        if let Some(geofence) = roster.geofences.iter().find(|g| g.radius_meters <= 0.0) {
            return Err(format!(
                "geofence '{}' must have a positive radius",
                geofence.id
            ));
        }

        let shops = unique_ids("shop", roster.shops.iter().map(|s| s.id.as_str()))?;
        let geofences = unique_ids("geofence", roster.geofences.iter().map(|g| g.id.as_str()))?;
        let employees = unique_ids("employee", roster.employees.iter().map(|e| e.id.as_str()))?;
        unique_ids("deduction", roster.deductions.iter().map(|d| d.id.as_str()))?;
        unique_ids("loan", roster.loans.iter().map(|l| l.id.as_str()))?;

        for geofence in &roster.geofences {
            if let Some(shop_id) = &geofence.shop_id {
                known("shop", &shops, shop_id, &format!("geofence '{}'", geofence.id))?;
            }
        }
        for assignment in &roster.shop_assignments {
            let context = format!(
                "shop assignment {}/{}",
                assignment.employee_id, assignment.shop_id
            );
            known("employee", &employees, &assignment.employee_id, &context)?;
            known("shop", &shops, &assignment.shop_id, &context)?;
        }
        for assignment in &roster.geofence_assignments {
            let context = format!(
                "geofence assignment {}/{}",
                assignment.employee_id, assignment.geofence_id
            );
            known("employee", &employees, &assignment.employee_id, &context)?;
            known("geofence", &geofences, &assignment.geofence_id, &context)?;
        }
        for deduction in &roster.deductions {
            let context = format!("deduction '{}'", deduction.id);
            known("employee", &employees, &deduction.employee_id, &context)?;
        }
        for loan in &roster.loans {
            let context = format!("loan '{}'", loan.id);
            known("employee", &employees, &loan.employee_id, &context)?;
        }

        Ok(())
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> AttendanceResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| AttendanceError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| AttendanceError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Returns the organization settings.
    pub fn organization(&self) -> &OrganizationConfig {
        self.config.organization()
    }

    /// Returns the organization's fixed UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        self.config.utc_offset()
    }

    /// Returns the configured break policy.
    pub fn break_policy(&self) -> BreakPolicy {
        self.config.organization().break_policy
    }

    /// Returns the pay period used when none is requested.
    pub fn default_pay_period(&self) -> PayPeriodKind {
        self.config.organization().default_pay_period
    }

    /// Returns the first active overtime rule, if any.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attendance_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/shop")?;
    /// if let Some(rule) = loader.active_overtime_rule() {
    ///     println!("Overtime after {} hours/week", rule.weekly_threshold_hours);
    /// }
    /// # Ok::<(), attendance_engine::error::AttendanceError>(())
    /// ```
    pub fn active_overtime_rule(&self) -> Option<&OvertimeRule> {
        self.config.overtime_rules().iter().find(|r| r.is_active)
    }

    /// Returns the roster used to seed the store.
    pub fn roster(&self) -> &Roster {
        self.config.roster()
    }
}

/// Collects ids, failing on the first duplicate.
fn unique_ids<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(format!("duplicate {} id '{}'", kind, id));
        }
    }
    Ok(seen)
}

fn known(kind: &str, ids: &HashSet<&str>, id: &str, context: &str) -> Result<(), String> {
    if ids.contains(id) {
        Ok(())
    } else {
        Err(format!("{} references unknown {} '{}'", context, kind, id))
    }
}
