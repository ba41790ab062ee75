// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TTL-cached pod state with change notification.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::Instant;

use super::ManagerConfig;
use crate::backend::{BackendApi, DeviceWithUsers, UserTelemetry};
use crate::error::{Result, ValidationError};
use crate::event::Observer;
use crate::state::{DeviceState, StateChange, UserState, presence_changes};
use crate::types::{Level, Side};

/// Cache and observer list, guarded together.
struct Cache {
    snapshot: Option<Arc<DeviceState>>,
    expires_at: Option<Instant>,
    /// Bumped by every invalidation.
    generation: u64,
    observers: Vec<Arc<dyn Observer>>,
}

impl Cache {
    fn fresh(&self, now: Instant) -> Option<Arc<DeviceState>> {
        match (&self.snapshot, self.expires_at) {
            (Some(snapshot), Some(expires_at)) if now < expires_at => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }
}

/// Single source of truth for one pod's state.
///
/// Reads are served from a snapshot cached for [`ManagerConfig::cache_ttl`].
/// Mutations go straight to the backend and invalidate the cache; the cached
/// snapshot is never patched in place. Registered [`Observer`]s are told
/// about every refresh that replaced an earlier snapshot.
///
/// Refreshes are single-flight: concurrent readers on a stale cache wait for
/// one backend round-trip and share its result.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use eightbridge::backend::CloudClient;
/// use eightbridge::event::LoggingObserver;
/// use eightbridge::manager::StateManager;
/// use eightbridge::types::Side;
///
/// # async fn example() -> eightbridge::Result<()> {
/// let client = CloudClient::new("access-token")?;
/// let manager = StateManager::new(client, "pod-1");
/// manager.add_observer(Arc::new(LoggingObserver::new()));
///
/// let state = manager.get_state().await?;
/// if let Some(left) = state.user(Side::Left) {
///     println!("left level: {}", left.target_level());
/// }
///
/// manager.set_temperature(Side::Left, -20).await?;
/// # Ok(())
/// # }
/// ```
pub struct StateManager<B> {
    backend: B,
    device_id: String,
    config: ManagerConfig,
    cache: RwLock<Cache>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl<B: BackendApi> StateManager<B> {
    /// Creates a manager with the default configuration.
    #[must_use]
    pub fn new(backend: B, device_id: impl Into<String>) -> Self {
        Self::with_config(backend, device_id, ManagerConfig::default())
    }

    /// Creates a manager with a custom configuration.
    #[must_use]
    pub fn with_config(backend: B, device_id: impl Into<String>, config: ManagerConfig) -> Self {
        Self {
            backend,
            device_id: device_id.into(),
            config,
            cache: RwLock::new(Cache {
                snapshot: None,
                expires_at: None,
                generation: 0,
                observers: Vec::new(),
            }),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Device this manager tracks.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Returns the backend client.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the current state, refreshing it if the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the device fetch fails. The cached
    /// snapshot is left untouched in that case.
    pub async fn get_state(&self) -> Result<Arc<DeviceState>> {
        let cached = self.cache.read().fresh(Instant::now());
        if let Some(snapshot) = cached {
            tracing::trace!(device_id = %self.device_id, "State cache hit");
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited.
        let cached = self.cache.read().fresh(Instant::now());
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    /// Returns the cached snapshot without refreshing, even if stale.
    #[must_use]
    pub fn cached_state(&self) -> Option<Arc<DeviceState>> {
        self.cache.read().snapshot.clone()
    }

    /// Forces the next [`get_state`](Self::get_state) to refresh.
    ///
    /// The cached snapshot stays available through
    /// [`cached_state`](Self::cached_state). A refresh already in flight
    /// installs its result without marking it fresh.
    pub fn invalidate_cache(&self) {
        let mut cache = self.cache.write();
        cache.expires_at = None;
        cache.generation = cache.generation.wrapping_add(1);
        tracing::debug!(device_id = %self.device_id, "State cache invalidated");
    }

    /// Sets the target level of a side.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `level` is outside `[-100, 100]` (no
    /// backend call is made) or if no user is assigned to `side`. Backend
    /// failures are returned as-is.
    pub async fn set_temperature(&self, side: Side, level: i32) -> Result<()> {
        let level = Level::new(level)?;
        let user_id = self.user_id(side).await?;
        self.backend.set_user_temperature(&user_id, level).await?;
        self.invalidate_cache();
        tracing::info!(%side, %level, "Temperature set");
        Ok(())
    }

    /// Turns a side on.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no user is assigned to `side`, or the
    /// backend's error.
    pub async fn turn_on(&self, side: Side) -> Result<()> {
        self.set_power(side, true).await
    }

    /// Turns a side off.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no user is assigned to `side`, or the
    /// backend's error.
    pub async fn turn_off(&self, side: Side) -> Result<()> {
        self.set_power(side, false).await
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.cache.write().observers.push(observer);
    }

    /// Unregisters an observer by identity.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_observer(&self, observer: &Arc<dyn Observer>) -> bool {
        let mut cache = self.cache.write();
        match cache.observers.iter().position(|o| Arc::ptr_eq(o, observer)) {
            Some(index) => {
                cache.observers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.cache.read().observers.len()
    }

    async fn set_power(&self, side: Side, on: bool) -> Result<()> {
        let user_id = self.user_id(side).await?;
        self.backend.set_user_power(&user_id, on).await?;
        self.invalidate_cache();
        tracing::info!(%side, on, "Power set");
        Ok(())
    }

    async fn user_id(&self, side: Side) -> Result<String> {
        let state = self.get_state().await?;
        state
            .user(side)
            .map(|user| user.id().to_string())
            .ok_or_else(|| ValidationError::NoUserAssigned(side).into())
    }

    /// Fetches a new snapshot, installs it and notifies observers.
    ///
    /// Callers must hold the refresh gate.
    async fn refresh(&self) -> Result<Arc<DeviceState>> {
        let generation = self.cache.read().generation;

        let device = self
            .backend
            .fetch_device_with_users(&self.device_id)
            .await?;
        let (left, right) = tokio::join!(
            self.fetch_side(&device, Side::Left),
            self.fetch_side(&device, Side::Right)
        );

        let id = if device.id.is_empty() {
            self.device_id.clone()
        } else {
            device.id.clone()
        };
        let mut state = DeviceState::new(id)
            .with_room_temperature(device.room_temperature)
            .with_water(device.has_water(), device.is_priming, device.needs_priming);
        for user in [left, right].into_iter().flatten() {
            state = state.with_user(user);
        }
        let new = Arc::new(state);

        let (old, observers) = {
            let mut cache = self.cache.write();
            let old = cache.snapshot.replace(Arc::clone(&new));
            cache.expires_at = if cache.generation == generation {
                Some(Instant::now() + self.config.cache_ttl())
            } else {
                tracing::debug!(
                    device_id = %self.device_id,
                    "Cache invalidated during refresh; snapshot stored as stale"
                );
                None
            };
            (old, cache.observers.clone())
        };

        tracing::debug!(
            device_id = %self.device_id,
            left = new.left().is_some(),
            right = new.right().is_some(),
            "State refreshed"
        );

        if let Some(old) = old {
            notify(&observers, old, Arc::clone(&new));
        }
        Ok(new)
    }

    async fn fetch_side(&self, device: &DeviceWithUsers, side: Side) -> Option<UserState> {
        let user_id = device.user_id(side)?;

        let temperature = match self.backend.fetch_user_temperature(user_id).await {
            Ok(temperature) => temperature,
            Err(e) => {
                tracing::warn!(%side, user_id, error = %e, "Failed to fetch side state, omitting side");
                return None;
            }
        };

        let user = UserState::new(user_id, side)
            .with_target_level(temperature.current_level)
            .with_state(temperature.current_state);

        match self.backend.fetch_user_telemetry(user_id).await {
            Ok(Some(telemetry)) => Some(with_telemetry(user, telemetry)),
            Ok(None) => Some(user),
            Err(e) => {
                tracing::warn!(%side, user_id, error = %e, "Failed to fetch telemetry");
                Some(user)
            }
        }
    }
}

fn with_telemetry(user: UserState, telemetry: UserTelemetry) -> UserState {
    let user = user
        .with_bed_temperature(telemetry.bed_temperature)
        .with_heart_rate(telemetry.heart_rate)
        .with_hrv(telemetry.hrv)
        .with_breath_rate(telemetry.breath_rate)
        .with_sleep_stage(telemetry.sleep_stage);
    match telemetry.last_heart_rate_time {
        Some(at) => user.with_last_heart_rate_time(at),
        None => user,
    }
}

/// Delivers the state change, then presence changes left before right.
fn notify(observers: &[Arc<dyn Observer>], old: Arc<DeviceState>, new: Arc<DeviceState>) {
    if observers.is_empty() {
        return;
    }
    let presence = presence_changes(&old, &new, Utc::now());
    let change = StateChange::new(old, new);

    for observer in observers {
        observer.on_state_change(&change);
    }
    for presence_change in &presence {
        for observer in observers {
            observer.on_presence_change(presence_change);
        }
    }
}

impl<B> std::fmt::Debug for StateManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.read();
        f.debug_struct("StateManager")
            .field("device_id", &self.device_id)
            .field("config", &self.config)
            .field("cached", &cache.snapshot.is_some())
            .field("observers", &cache.observers.len())
            .finish_non_exhaustive()
    }
}
