//! Persistence layer.
//!
//! [`AttendanceStore`] is the seam between the engine and whatever holds
//! employees, geofences, pay rules and punches. The engine ships with
//! [`MemoryStore`]; a relational implementation plugs in behind the same
//! trait.
//!
//! Three guarantees are required of every implementation, all enforced
//! inside [`AttendanceStore::insert_punch`]:
//! - a punch whose idempotency key the same employee already used is not
//!   inserted again
//! - a punch timed before the employee's latest recorded punch is refused
//! - a CLOCK_IN is refused while the employee already has an open shift

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AttendanceResult;
use crate::models::{
    Deduction, Employee, Geofence, GeofenceAssignment, LoanAdvance, PunchRecord, Shop,
    ShopAssignment,
};

pub use memory::MemoryStore;

/// The reference data a store is seeded with.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Shops.
    pub shops: Vec<Shop>,
    /// Shop-level and standalone geofences.
    pub geofences: Vec<Geofence>,
    /// Employees.
    pub employees: Vec<Employee>,
    /// Employee to shop membership.
    pub shop_assignments: Vec<ShopAssignment>,
    /// Employee to geofence overrides.
    pub geofence_assignments: Vec<GeofenceAssignment>,
    /// Recurring deductions.
    pub deductions: Vec<Deduction>,
    /// Loans and pay advances.
    pub loans: Vec<LoanAdvance>,
}

/// Result of [`AttendanceStore::insert_punch`].
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The punch was stored.
    Inserted(PunchRecord),
    /// A punch with the same idempotency key already exists; nothing was stored.
    Duplicate(PunchRecord),
}

/// Filter for punch listings.
#[derive(Debug, Clone, Default)]
pub struct PunchQuery {
    /// Only punches of this employee.
    pub employee_id: Option<String>,
    /// Only punches attributed to this shop.
    pub shop_id: Option<String>,
    /// Only punches at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only punches at or before this instant.
    pub until: Option<DateTime<Utc>>,
}

impl PunchQuery {
    /// Returns true if `punch` satisfies every set filter.
    pub fn matches(&self, punch: &PunchRecord) -> bool {
        self.employee_id
            .as_deref()
            .is_none_or(|id| punch.employee_id == id)
            && self
                .shop_id
                .as_deref()
                .is_none_or(|id| punch.shop_id.as_deref() == Some(id))
            && self.since.is_none_or(|since| punch.timestamp >= since)
            && self.until.is_none_or(|until| punch.timestamp <= until)
    }
}

/// Storage operations needed by the recorder and the reports.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Looks up an employee.
    async fn employee(&self, employee_id: &str) -> AttendanceResult<Option<Employee>>;

    /// Lists all employees.
    async fn employees(&self) -> AttendanceResult<Vec<Employee>>;

    /// Looks up a shop.
    async fn shop(&self, shop_id: &str) -> AttendanceResult<Option<Shop>>;

    /// Lists the ids of employees assigned to a shop.
    async fn shop_members(&self, shop_id: &str) -> AttendanceResult<Vec<String>>;

    /// Lists the geofences of every shop the employee is assigned to.
    async fn shop_geofences_for(&self, employee_id: &str) -> AttendanceResult<Vec<Geofence>>;

    /// Lists the geofences assigned directly to the employee.
    async fn assigned_geofences_for(&self, employee_id: &str) -> AttendanceResult<Vec<Geofence>>;

    /// Lists punches matching `query`, in timestamp order.
    async fn punches(&self, query: &PunchQuery) -> AttendanceResult<Vec<PunchRecord>>;

    /// Looks up a punch by id.
    async fn punch(&self, punch_id: Uuid) -> AttendanceResult<Option<PunchRecord>>;

    /// Looks up the punch an employee recorded under an idempotency key.
    ///
    /// Keys are scoped per employee: the same key used by two employees
    /// names two unrelated punches.
    async fn find_by_idempotency_key(
        &self,
        employee_id: &str,
        key: &str,
    ) -> AttendanceResult<Option<PunchRecord>>;

    /// Atomically stores a new punch.
    ///
    /// # Errors
    ///
    /// - [`crate::error::AttendanceError::OutOfOrderPunch`] if the punch is
    ///   timed before the employee's latest recorded punch
    /// - [`crate::error::AttendanceError::OpenShiftConflict`] if the punch is
    ///   a CLOCK_IN and the employee already has an open shift
    async fn insert_punch(&self, punch: PunchRecord) -> AttendanceResult<InsertOutcome>;

    /// Replaces a stored punch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AttendanceError::PunchNotFound`] if no punch
    /// has the same id.
    async fn update_punch(&self, punch: PunchRecord) -> AttendanceResult<()>;

    /// Lists the employee's deductions.
    async fn deductions_for(&self, employee_id: &str) -> AttendanceResult<Vec<Deduction>>;

    /// Lists the employee's loans.
    async fn loans_for(&self, employee_id: &str) -> AttendanceResult<Vec<LoanAdvance>>;
}
