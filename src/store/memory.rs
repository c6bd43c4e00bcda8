//! In-memory store.
//!
//! Thread-safe, backed by a single `RwLock` so the idempotency, ordering
//! and open-shift checks in `insert_punch` happen under the same write
//! guard as the insert itself.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{AttendanceStore, InsertOutcome, PunchQuery, Roster};
use crate::calculation::{derive_state, sort_chronologically};
use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{
    Deduction, Employee, Geofence, LoanAdvance, PunchRecord, PunchType, Shop,
};

#[derive(Debug, Default)]
struct Inner {
    roster: Roster,
    punches: Vec<PunchRecord>,
    by_id: HashMap<Uuid, usize>,
    /// Keyed by (employee id, idempotency key).
    by_idempotency_key: HashMap<(String, String), usize>,
}

impl Inner {
    fn employee_punches(&self, employee_id: &str) -> Vec<PunchRecord> {
        self.punches
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect()
    }

    fn idempotent_match(&self, employee_id: &str, key: &str) -> Option<&PunchRecord> {
        self.by_idempotency_key
            .get(&(employee_id.to_string(), key.to_string()))
            .and_then(|&index| self.punches.get(index))
    }

    fn geofences_by_ids<'a>(&self, ids: impl Iterator<Item = &'a str>) -> Vec<Geofence> {
        ids.flat_map(|id| self.roster.geofences.iter().filter(move |g| g.id == id))
            .cloned()
            .collect()
    }
}

/// Store holding everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with reference data.
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            inner: RwLock::new(Inner {
                roster,
                ..Inner::default()
            }),
        }
    }

    /// Returns the number of stored punches.
    pub async fn punch_count(&self) -> usize {
        self.inner.read().await.punches.len()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn employee(&self, employee_id: &str) -> AttendanceResult<Option<Employee>> {
        let inner = self.inner.read().await;
        Ok(inner
            .roster
            .employees
            .iter()
            .find(|e| e.id == employee_id)
            .cloned())
    }

    async fn employees(&self) -> AttendanceResult<Vec<Employee>> {
        Ok(self.inner.read().await.roster.employees.clone())
    }

    async fn shop(&self, shop_id: &str) -> AttendanceResult<Option<Shop>> {
        let inner = self.inner.read().await;
        Ok(inner.roster.shops.iter().find(|s| s.id == shop_id).cloned())
    }

    async fn shop_members(&self, shop_id: &str) -> AttendanceResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .roster
            .shop_assignments
            .iter()
            .filter(|a| a.shop_id == shop_id)
            .map(|a| a.employee_id.clone())
            .collect())
    }

    async fn shop_geofences_for(&self, employee_id: &str) -> AttendanceResult<Vec<Geofence>> {
        let inner = self.inner.read().await;
        let shop_ids: Vec<&str> = inner
            .roster
            .shop_assignments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .map(|a| a.shop_id.as_str())
            .collect();
        Ok(inner
            .roster
            .geofences
            .iter()
            .filter(|g| {
                g.shop_id
                    .as_deref()
                    .is_some_and(|shop_id| shop_ids.contains(&shop_id))
            })
            .cloned()
            .collect())
    }

    async fn assigned_geofences_for(&self, employee_id: &str) -> AttendanceResult<Vec<Geofence>> {
        let inner = self.inner.read().await;
        let ids = inner
            .roster
            .geofence_assignments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .map(|a| a.geofence_id.as_str());
        Ok(inner.geofences_by_ids(ids))
    }

    async fn punches(&self, query: &PunchQuery) -> AttendanceResult<Vec<PunchRecord>> {
        let inner = self.inner.read().await;
        let mut punches: Vec<PunchRecord> = inner
            .punches
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        sort_chronologically(&mut punches);
        Ok(punches)
    }

    async fn punch(&self, punch_id: Uuid) -> AttendanceResult<Option<PunchRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_id
            .get(&punch_id)
            .and_then(|&index| inner.punches.get(index))
            .cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        employee_id: &str,
        key: &str,
    ) -> AttendanceResult<Option<PunchRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.idempotent_match(employee_id, key).cloned())
    }

    async fn insert_punch(&self, punch: PunchRecord) -> AttendanceResult<InsertOutcome> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = punch
            .idempotency_key
            .as_deref()
            .and_then(|key| inner.idempotent_match(&punch.employee_id, key))
        {
            debug!(punch_id = %existing.id, "idempotency key already recorded");
            return Ok(InsertOutcome::Duplicate(existing.clone()));
        }

        let history = inner.employee_punches(&punch.employee_id);
        if let Some(latest_punch) = history
            .iter()
            .map(|p| p.timestamp)
            .max()
            .filter(|&latest| latest > punch.timestamp)
        {
            return Err(AttendanceError::OutOfOrderPunch {
                timestamp: punch.timestamp,
                latest_punch,
            });
        }

        if punch.punch_type == PunchType::ClockIn {
            if let Some(last_clock_in) = derive_state(&history).open_clock_in() {
                return Err(AttendanceError::OpenShiftConflict {
                    employee_id: punch.employee_id.clone(),
                    last_clock_in,
                });
            }
        }

        let index = inner.punches.len();
        inner.by_id.insert(punch.id, index);
        if let Some(key) = &punch.idempotency_key {
            inner
                .by_idempotency_key
                .insert((punch.employee_id.clone(), key.clone()), index);
        }
        inner.punches.push(punch.clone());
        Ok(InsertOutcome::Inserted(punch))
    }

    async fn update_punch(&self, punch: PunchRecord) -> AttendanceResult<()> {
        let mut inner = self.inner.write().await;
        let index = inner
            .by_id
            .get(&punch.id)
            .copied()
            .ok_or_else(|| AttendanceError::PunchNotFound {
                punch_id: punch.id.to_string(),
            })?;
        inner.punches[index] = punch;
        Ok(())
    }

    async fn deductions_for(&self, employee_id: &str) -> AttendanceResult<Vec<Deduction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .roster
            .deductions
            .iter()
            .filter(|d| d.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn loans_for(&self, employee_id: &str) -> AttendanceResult<Vec<LoanAdvance>> {
        let inner = self.inner.read().await;
        Ok(inner
            .roster
            .loans
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::{GeofenceAssignment, PayType, ShopAssignment};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 13, hour, 0, 0).unwrap()
    }

    fn geofence(id: &str, shop_id: Option<&str>) -> Geofence {
        Geofence {
            id: id.to_string(),
            name: id.to_string(),
            shop_id: shop_id.map(str::to_string),
            latitude: 40.7128,
            longitude: -74.006,
            radius_meters: 150.0,
            is_required: true,
            is_active: true,
        }
    }

    fn roster() -> Roster {
        Roster {
            shops: vec![Shop {
                id: "shop_main".to_string(),
                name: "Main Street Garage".to_string(),
            }],
            geofences: vec![
                geofence("gf_main", Some("shop_main")),
                geofence("gf_yard", None),
            ],
            employees: vec![Employee {
                id: "emp_001".to_string(),
                name: "Alex Rivera".to_string(),
                role: "MECHANIC".to_string(),
                pay_type: PayType::Hourly,
                pay_rate: rust_decimal::Decimal::new(20, 0),
                overtime_rate: None,
                pin_hash: None,
                is_active: true,
            }],
            shop_assignments: vec![ShopAssignment {
                employee_id: "emp_001".to_string(),
                shop_id: "shop_main".to_string(),
            }],
            geofence_assignments: vec![GeofenceAssignment {
                employee_id: "emp_001".to_string(),
                geofence_id: "gf_yard".to_string(),
            }],
            deductions: vec![],
            loans: vec![],
        }
    }

    fn punch(punch_type: PunchType, hour: u32) -> PunchRecord {
        PunchRecord::new("emp_001", punch_type, at(hour), at(hour))
    }

    #[tokio::test]
    async fn test_geofence_lookups() {
        let store = MemoryStore::with_roster(roster());

        let shop = store.shop_geofences_for("emp_001").await.unwrap();
        assert_eq!(shop.len(), 1);
        assert_eq!(shop[0].id, "gf_main");

        let assigned = store.assigned_geofences_for("emp_001").await.unwrap();
        assert_eq!(assigned[0].id, "gf_yard");

        assert!(store.shop_geofences_for("emp_404").await.unwrap().is_empty());
        assert_eq!(store.shop_members("shop_main").await.unwrap(), vec!["emp_001"]);
    }

    #[tokio::test]
    async fn test_second_open_shift_is_refused() {
        let store = MemoryStore::new();
        store.insert_punch(punch(PunchType::ClockIn, 9)).await.unwrap();

        let result = store.insert_punch(punch(PunchType::ClockIn, 10)).await;
        assert!(matches!(
            result,
            Err(AttendanceError::OpenShiftConflict { last_clock_in, .. }) if last_clock_in == at(9)
        ));
        assert_eq!(store.punch_count().await, 1);
    }

    #[tokio::test]
    async fn test_clock_in_after_clock_out_is_accepted() {
        let store = MemoryStore::new();
        store.insert_punch(punch(PunchType::ClockIn, 9)).await.unwrap();
        store.insert_punch(punch(PunchType::ClockOut, 12)).await.unwrap();
        let outcome = store.insert_punch(punch(PunchType::ClockIn, 13)).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_returns_existing() {
        let store = MemoryStore::new();
        let mut first = punch(PunchType::ClockIn, 9);
        first.idempotency_key = Some("key-1".to_string());
        let mut retry = punch(PunchType::ClockIn, 9);
        retry.idempotency_key = Some("key-1".to_string());

        store.insert_punch(first.clone()).await.unwrap();
        let outcome = store.insert_punch(retry).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Duplicate(first.clone()));
        assert_eq!(store.punch_count().await, 1);
        assert_eq!(
            store.find_by_idempotency_key("emp_001", "key-1").await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_idempotency_keys_are_scoped_per_employee() {
        let store = MemoryStore::new();
        let mut alex = punch(PunchType::ClockIn, 9);
        alex.idempotency_key = Some("shared".to_string());
        let mut jordan = PunchRecord::new("emp_002", PunchType::ClockIn, at(9), at(9));
        jordan.idempotency_key = Some("shared".to_string());

        store.insert_punch(alex.clone()).await.unwrap();
        let outcome = store.insert_punch(jordan.clone()).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted(jordan.clone()));
        assert_eq!(store.punch_count().await, 2);
        assert_eq!(
            store.find_by_idempotency_key("emp_002", "shared").await.unwrap(),
            Some(jordan)
        );
        assert_eq!(
            store.find_by_idempotency_key("emp_003", "shared").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_backdated_punch_before_latest_is_refused() {
        let store = MemoryStore::new();
        store.insert_punch(punch(PunchType::ClockIn, 9)).await.unwrap();
        store.insert_punch(punch(PunchType::ClockOut, 17)).await.unwrap();

        let result = store.insert_punch(punch(PunchType::ClockIn, 12)).await;
        assert!(matches!(
            result,
            Err(AttendanceError::OutOfOrderPunch { latest_punch, .. }) if latest_punch == at(17)
        ));
        assert_eq!(store.punch_count().await, 2);

        // Other employees are unaffected
        let other = PunchRecord::new("emp_002", PunchType::ClockIn, at(12), at(12));
        assert!(store.insert_punch(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_lookup_by_id() {
        let store = MemoryStore::new();
        let mut stored = punch(PunchType::ClockIn, 9);
        store.insert_punch(stored.clone()).await.unwrap();

        stored.append_note("[APPROVED]");
        store.update_punch(stored.clone()).await.unwrap();

        let found = store.punch(stored.id).await.unwrap().unwrap();
        assert_eq!(found.notes.as_deref(), Some("[APPROVED]"));
    }

    #[tokio::test]
    async fn test_update_unknown_punch_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update_punch(punch(PunchType::ClockIn, 9)).await;
        assert!(matches!(result, Err(AttendanceError::PunchNotFound { .. })));
    }

    #[tokio::test]
    async fn test_punch_query_filters_and_sorts() {
        let store = MemoryStore::new();
        let mut other = PunchRecord::new("emp_002", PunchType::ClockIn, at(8), at(8));
        other.shop_id = Some("shop_north".to_string());
        store.insert_punch(other).await.unwrap();
        store.insert_punch(punch(PunchType::ClockIn, 9)).await.unwrap();
        // Same instant as the clock-in, received later
        let mut same_instant = punch(PunchType::BreakStart, 9);
        same_instant.created_at = at(10);
        store.insert_punch(same_instant).await.unwrap();
        store.insert_punch(punch(PunchType::ClockOut, 17)).await.unwrap();

        let query = PunchQuery {
            employee_id: Some("emp_001".to_string()),
            ..PunchQuery::default()
        };
        let punches = store.punches(&query).await.unwrap();
        assert_eq!(punches.len(), 3);
        assert_eq!(punches[0].punch_type, PunchType::ClockIn);
        assert_eq!(punches[1].punch_type, PunchType::BreakStart);

        let query = PunchQuery {
            shop_id: Some("shop_north".to_string()),
            since: Some(at(8)),
            ..PunchQuery::default()
        };
        assert_eq!(store.punches(&query).await.unwrap().len(), 1);
    }
}
