// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the state manager against an in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use eightbridge::backend::{BackendApi, DeviceWithUsers, UserTelemetry, UserTemperature};
use eightbridge::error::{BackendError, Error, ValidationError};
use eightbridge::event::{EventBus, Observer, StateEvent};
use eightbridge::manager::{ManagerConfig, StateManager};
use eightbridge::state::{PresenceChange, StateChange};
use eightbridge::types::{Level, PowerState, Side};
use parking_lot::Mutex;

/// Backend whose answers are set by the test.
#[derive(Default)]
struct StubBackend {
    device: Mutex<DeviceWithUsers>,
    temperatures: Mutex<HashMap<String, UserTemperature>>,
    telemetry: Mutex<HashMap<String, UserTelemetry>>,
    failing_users: Mutex<Vec<String>>,
    failing_telemetry: Mutex<Vec<String>>,
    fail_device: AtomicBool,
    fetch_delay: Option<Duration>,
    device_calls: AtomicUsize,
    mutations: Mutex<Vec<String>>,
}

impl StubBackend {
    fn two_sides() -> Self {
        let backend = Self::default();
        *backend.device.lock() = DeviceWithUsers {
            id: "pod-1".to_string(),
            left_user_id: Some("user-l".to_string()),
            right_user_id: Some("user-r".to_string()),
            room_temperature: 20.0,
            water_level: 100,
            ..DeviceWithUsers::default()
        };
        backend.set_temperature("user-l", -20, PowerState::Smart);
        backend.set_temperature("user-r", 10, PowerState::Off);
        backend
    }

    fn left_only() -> Self {
        let backend = Self::two_sides();
        backend.device.lock().right_user_id = None;
        backend
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    fn set_temperature(&self, user: &str, level: i32, state: PowerState) {
        self.temperatures.lock().insert(
            user.to_string(),
            UserTemperature {
                current_level: level,
                current_state: state,
            },
        );
    }

    fn set_last_heart_rate(&self, user: &str, minutes_ago: i64) {
        self.telemetry.lock().insert(
            user.to_string(),
            UserTelemetry {
                last_heart_rate_time: Some(Utc::now() - chrono::Duration::minutes(minutes_ago)),
                ..UserTelemetry::default()
            },
        );
    }

    fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    fn mutations(&self) -> Vec<String> {
        self.mutations.lock().clone()
    }
}

impl BackendApi for StubBackend {
    async fn fetch_device_with_users(
        &self,
        _device_id: &str,
    ) -> Result<DeviceWithUsers, BackendError> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_device.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("device offline".to_string()));
        }
        Ok(self.device.lock().clone())
    }

    async fn fetch_user_temperature(&self, user_id: &str) -> Result<UserTemperature, BackendError> {
        if self.failing_users.lock().iter().any(|u| u == user_id) {
            return Err(BackendError::Unavailable(format!("{user_id} unavailable")));
        }
        let temperature = self.temperatures.lock().get(user_id).copied();
        temperature.ok_or_else(|| BackendError::Status {
            status: 404,
            body: "unknown user".to_string(),
        })
    }

    async fn set_user_temperature(&self, user_id: &str, level: Level) -> Result<(), BackendError> {
        self.mutations
            .lock()
            .push(format!("temperature:{user_id}:{level}"));
        Ok(())
    }

    async fn set_user_power(&self, user_id: &str, on: bool) -> Result<(), BackendError> {
        self.mutations.lock().push(format!("power:{user_id}:{on}"));
        Ok(())
    }

    async fn fetch_user_telemetry(
        &self,
        user_id: &str,
    ) -> Result<Option<UserTelemetry>, BackendError> {
        if self.failing_telemetry.lock().iter().any(|u| u == user_id) {
            return Err(BackendError::Unavailable("telemetry offline".to_string()));
        }
        Ok(self.telemetry.lock().get(user_id).cloned())
    }
}

/// Observer that appends to a log shared with other recorders.
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Observer for Recorder {
    fn on_state_change(&self, _change: &StateChange) {
        self.log.lock().push(format!("{}:state", self.name));
    }

    fn on_presence_change(&self, change: &PresenceChange) {
        self.log
            .lock()
            .push(format!("{}:presence:{}:{}", self.name, change.side, change.present));
    }
}

fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Observer> {
    Arc::new(Recorder {
        name,
        log: Arc::clone(log),
    })
}

// ============================================================================
// Cache
// ============================================================================

mod cache {
    use super::*;

    #[tokio::test]
    async fn hit_returns_same_snapshot() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");

        let first = manager.get_state().await.unwrap();
        let second = manager.get_state().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.backend().device_calls(), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_one_fetch() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        let first = manager.get_state().await.unwrap();

        manager.invalidate_cache();
        let second = manager.get_state().await.unwrap();
        let third = manager.get_state().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(manager.backend().device_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_expires_after_ttl() {
        let config = ManagerConfig::default().with_cache_ttl(Duration::from_secs(30));
        let manager = StateManager::with_config(StubBackend::two_sides(), "pod-1", config);

        manager.get_state().await.unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        manager.get_state().await.unwrap();
        assert_eq!(manager.backend().device_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        manager.get_state().await.unwrap();
        assert_eq!(manager.backend().device_calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        let first = manager.get_state().await.unwrap();

        manager.backend().fail_device.store(true, Ordering::SeqCst);
        manager.invalidate_cache();
        let err = manager.get_state().await.unwrap_err();

        assert!(matches!(err, Error::Backend(BackendError::Unavailable(_))));
        assert!(Arc::ptr_eq(&first, &manager.cached_state().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_fetch() {
        let backend = StubBackend::two_sides().with_delay(Duration::from_millis(50));
        let manager = StateManager::new(backend, "pod-1");

        let (a, b, c) = tokio::join!(manager.get_state(), manager.get_state(), manager.get_state());

        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(manager.backend().device_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_refresh_leaves_snapshot_stale() {
        let backend = StubBackend::two_sides().with_delay(Duration::from_millis(100));
        let manager = Arc::new(StateManager::new(backend, "pod-1"));

        let reader = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_state().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.invalidate_cache();

        let installed = reader.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&installed, &manager.cached_state().unwrap()));

        let next = manager.get_state().await.unwrap();
        assert!(!Arc::ptr_eq(&installed, &next));
        assert_eq!(manager.backend().device_calls(), 2);
    }
}

// ============================================================================
// Snapshot contents
// ============================================================================

mod snapshot {
    use super::*;

    #[tokio::test]
    async fn two_occupied_sides() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        let state = manager.get_state().await.unwrap();

        let left = state.user(Side::Left).unwrap();
        assert!(left.is_on());
        assert_eq!(left.target_level(), -20);
        assert_eq!(left.state(), PowerState::Smart);

        let right = state.user(Side::Right).unwrap();
        assert!(!right.is_on());
        assert_eq!(right.target_level(), 10);
        assert!(state.has_both_sides());
    }

    #[tokio::test]
    async fn failing_side_is_omitted() {
        let backend = StubBackend::two_sides();
        backend.failing_users.lock().push("user-r".to_string());
        let manager = StateManager::new(backend, "pod-1");

        let state = manager.get_state().await.unwrap();

        assert!(state.left().is_some());
        assert!(state.right().is_none());
    }

    #[tokio::test]
    async fn failing_telemetry_keeps_side() {
        let backend = StubBackend::two_sides();
        backend.failing_telemetry.lock().push("user-l".to_string());
        let manager = StateManager::new(backend, "pod-1");

        let state = manager.get_state().await.unwrap();
        let left = state.left().unwrap();

        assert_eq!(left.target_level(), -20);
        assert!(!left.is_present());
    }

    #[tokio::test]
    async fn empty_device_id_falls_back_to_configured() {
        let backend = StubBackend::two_sides();
        backend.device.lock().id = String::new();
        let manager = StateManager::new(backend, "pod-1");

        let state = manager.get_state().await.unwrap();
        assert_eq!(state.id(), "pod-1");
    }
}

// ============================================================================
// Mutations
// ============================================================================

mod mutations {
    use super::*;

    #[tokio::test]
    async fn set_temperature_invalidates_cache() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        manager.get_state().await.unwrap();

        manager.set_temperature(Side::Left, -35).await.unwrap();
        assert_eq!(manager.backend().mutations(), vec!["temperature:user-l:-35"]);

        manager.get_state().await.unwrap();
        assert_eq!(manager.backend().device_calls(), 2);
    }

    #[tokio::test]
    async fn power_targets_side_user() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");

        manager.turn_on(Side::Right).await.unwrap();
        manager.turn_off(Side::Left).await.unwrap();

        assert_eq!(
            manager.backend().mutations(),
            vec!["power:user-r:true", "power:user-l:false"]
        );
    }

    #[tokio::test]
    async fn out_of_range_level_makes_no_calls() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");

        for level in [-101, 101, 150] {
            let err = manager.set_temperature(Side::Left, level).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Validation(ValidationError::LevelOutOfRange(l)) if l == level
            ));
        }
        assert_eq!(manager.backend().device_calls(), 0);
        assert!(manager.backend().mutations().is_empty());
    }

    #[tokio::test]
    async fn boundary_levels_are_accepted() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");

        manager.set_temperature(Side::Left, -100).await.unwrap();
        manager.set_temperature(Side::Left, 100).await.unwrap();

        assert_eq!(manager.backend().mutations().len(), 2);
    }

    #[tokio::test]
    async fn unassigned_side_is_rejected() {
        let manager = StateManager::new(StubBackend::left_only(), "pod-1");

        let err = manager.turn_on(Side::Right).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::NoUserAssigned(Side::Right))
        ));
        assert_eq!(err.to_string(), "no user assigned to right side");
        assert!(manager.backend().mutations().is_empty());
    }
}

// ============================================================================
// Observers
// ============================================================================

mod observers {
    use super::*;

    #[tokio::test]
    async fn first_refresh_is_silent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        manager.add_observer(recorder("a", &log));

        manager.get_state().await.unwrap();

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn refresh_notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        manager.add_observer(recorder("a", &log));
        manager.add_observer(recorder("b", &log));

        manager.get_state().await.unwrap();
        manager.invalidate_cache();
        manager.get_state().await.unwrap();

        assert_eq!(*log.lock(), vec!["a:state", "b:state"]);
    }

    #[tokio::test]
    async fn presence_follows_state_change() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let backend = StubBackend::two_sides();
        backend.set_last_heart_rate("user-l", 15);
        let manager = StateManager::new(backend, "pod-1");
        manager.add_observer(recorder("a", &log));

        manager.get_state().await.unwrap();
        manager.backend().set_last_heart_rate("user-l", 0);
        manager.invalidate_cache();
        manager.get_state().await.unwrap();

        assert_eq!(*log.lock(), vec!["a:state", "a:presence:left:true"]);
    }

    #[tokio::test]
    async fn leaving_bed_fires_absent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let backend = StubBackend::two_sides();
        backend.set_last_heart_rate("user-r", 0);
        let manager = StateManager::new(backend, "pod-1");
        manager.add_observer(recorder("a", &log));

        manager.get_state().await.unwrap();
        manager.backend().set_last_heart_rate("user-r", 15);
        manager.invalidate_cache();
        manager.get_state().await.unwrap();

        assert_eq!(*log.lock(), vec!["a:state", "a:presence:right:false"]);
    }

    #[tokio::test]
    async fn removed_observer_is_not_notified() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        let observer = recorder("a", &log);
        manager.add_observer(Arc::clone(&observer));

        manager.get_state().await.unwrap();
        assert!(manager.remove_observer(&observer));
        manager.invalidate_cache();
        manager.get_state().await.unwrap();

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn event_bus_receives_state_changes() {
        let manager = StateManager::new(StubBackend::two_sides(), "pod-1");
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        manager.add_observer(bus);

        let first = manager.get_state().await.unwrap();
        manager.invalidate_cache();
        let second = manager.get_state().await.unwrap();

        match rx.try_recv().unwrap() {
            StateEvent::StateChanged(change) => {
                assert!(Arc::ptr_eq(&change.old, &first));
                assert!(Arc::ptr_eq(&change.new, &second));
            }
            StateEvent::PresenceChanged(_) => panic!("expected a state change"),
        }
        assert!(rx.try_recv().is_err());
    }
}
