// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backend API port.
//!
//! The [`StateManager`](crate::manager::StateManager) talks to the vendor
//! cloud only through [`BackendApi`]. The crate ships one implementation,
//! [`CloudClient`] (feature `cloud`); tests and alternative transports
//! provide their own.

#[cfg(feature = "cloud")]
mod cloud;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

#[cfg(feature = "cloud")]
pub use cloud::{CloudClient, CloudConfig};

use crate::error::BackendError;
use crate::types::{Level, PowerState, Side, SleepStage};

/// Device record with the users assigned to each side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceWithUsers {
    /// Device identifier.
    pub id: String,
    /// User assigned to the left side.
    pub left_user_id: Option<String>,
    /// User assigned to the right side.
    pub right_user_id: Option<String>,
    /// Room temperature in degrees Celsius.
    pub room_temperature: f64,
    /// Reservoir water level; zero means empty.
    pub water_level: i32,
    /// Pod is priming.
    pub is_priming: bool,
    /// Pod asks to be primed.
    pub needs_priming: bool,
}

impl DeviceWithUsers {
    /// User assigned to `side`, if any.
    #[must_use]
    pub fn user_id(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left_user_id.as_deref(),
            Side::Right => self.right_user_id.as_deref(),
        }
    }

    /// Returns `true` if the reservoir holds any water.
    #[must_use]
    pub fn has_water(&self) -> bool {
        self.water_level > 0
    }
}

/// Current temperature settings of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTemperature {
    /// Target level in `[-100, 100]`.
    pub current_level: i32,
    /// Power state.
    pub current_state: PowerState,
}

/// Latest biometric readings of one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserTelemetry {
    /// Bed temperature in degrees Celsius.
    pub bed_temperature: f64,
    /// Heart rate in beats per minute.
    pub heart_rate: f64,
    /// Heart rate variability.
    pub hrv: f64,
    /// Breaths per minute.
    pub breath_rate: f64,
    /// Sleep stage.
    pub sleep_stage: SleepStage,
    /// Time of the last heart-rate sample.
    pub last_heart_rate_time: Option<DateTime<Utc>>,
}

/// Typed access to the vendor backend.
///
/// Implementations hold no state the manager relies on and apply no retry
/// policy of their own.
pub trait BackendApi: Send + Sync {
    /// Fetches a device and the users assigned to its sides.
    fn fetch_device_with_users(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<DeviceWithUsers, BackendError>> + Send;

    /// Fetches a user's temperature settings.
    fn fetch_user_temperature(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<UserTemperature, BackendError>> + Send;

    /// Sets a user's target level.
    fn set_user_temperature(
        &self,
        user_id: &str,
        level: Level,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Turns a user's side on or off.
    fn set_user_power(
        &self,
        user_id: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Fetches a user's latest biometrics.
    ///
    /// Returns `Ok(None)` by default, for backends without a telemetry feed.
    fn fetch_user_telemetry(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserTelemetry>, BackendError>> + Send {
        let _ = user_id;
        async { Ok(None) }
    }
}

impl<T: BackendApi> BackendApi for Arc<T> {
    fn fetch_device_with_users(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<DeviceWithUsers, BackendError>> + Send {
        (**self).fetch_device_with_users(device_id)
    }

    fn fetch_user_temperature(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<UserTemperature, BackendError>> + Send {
        (**self).fetch_user_temperature(user_id)
    }

    fn set_user_temperature(
        &self,
        user_id: &str,
        level: Level,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).set_user_temperature(user_id, level)
    }

    fn set_user_power(
        &self,
        user_id: &str,
        on: bool,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).set_user_power(user_id, on)
    }

    fn fetch_user_telemetry(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserTelemetry>, BackendError>> + Send {
        (**self).fetch_user_telemetry(user_id)
    }
}
