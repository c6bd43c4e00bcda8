//! Application state for the attendance API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::attendance::PunchRecorder;
use crate::clock::{Clock, SystemClock};
use crate::config::ConfigLoader;
use crate::store::{AttendanceStore, MemoryStore};

/// Shared application state.
///
/// Holds the loaded configuration, the punch store, the time source and
/// the recorder that serializes punches per employee.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    recorder: Arc<PunchRecorder>,
}

impl AppState {
    /// Creates state backed by an in-memory store seeded from the roster,
    /// using the wall clock.
    pub fn new(config: ConfigLoader) -> Self {
        let store = Arc::new(MemoryStore::with_roster(config.roster().clone()));
        Self::with_parts(config, store, Arc::new(SystemClock))
    }

    /// Creates state from explicit parts.
    pub fn with_parts(
        config: ConfigLoader,
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let recorder = Arc::new(PunchRecorder::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.break_policy(),
        ));
        Self {
            config: Arc::new(config),
            store,
            clock,
            recorder,
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the punch store.
    pub fn store(&self) -> &dyn AttendanceStore {
        self.store.as_ref()
    }

    /// Returns the punch recorder.
    pub fn recorder(&self) -> &PunchRecorder {
        &self.recorder
    }

    /// Returns the current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_store_is_seeded_from_roster() {
        let config = ConfigLoader::load("./config/shop").unwrap();
        let state = AppState::new(config);
        let employee = state.store().employee("emp_001").await.unwrap();
        assert_eq!(employee.unwrap().name, "Alex Rivera");
    }
}
