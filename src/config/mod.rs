//! Configuration loading and management for the attendance engine.
//!
//! This module loads the organization settings, overtime rules and the
//! roster (shops, geofences, employees, assignments, deductions, loans)
//! from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/shop").unwrap();
//! println!("Loaded organization: {}", config.organization().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AttendanceConfig, DeductionConfig, EmployeeConfig, GeofenceAssignmentConfig, GeofenceConfig,
    LoanConfig, OrganizationConfig, OvertimeRuleConfig, PayRulesConfig, RosterConfig,
    ShopAssignmentConfig, ShopConfig,
};
