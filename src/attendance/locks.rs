//! Per-employee serialization of punch submissions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A lazily populated map of one async mutex per employee.
///
/// Holding the guard returned by [`EmployeeLocks::acquire`] serializes the
/// read-validate-insert window of one employee without blocking others.
#[derive(Debug, Default)]
pub struct EmployeeLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl EmployeeLocks {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `employee_id`.
    pub async fn acquire(&self, employee_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(employee_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Returns the number of employees that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns true if no employee has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
