// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-side user state.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{PowerState, Side, SleepStage};

/// How recent a heart-rate sample must be for the side to count as occupied.
pub const PRESENCE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Thermal and biometric status of the user on one side.
///
/// Values are immutable once built; a refresh produces a new `UserState`.
///
/// # Examples
///
/// ```
/// use eightbridge::state::UserState;
/// use eightbridge::types::{PowerState, Side};
///
/// let user = UserState::new("user-1", Side::Left)
///     .with_target_level(-20)
///     .with_state(PowerState::Smart);
///
/// assert!(user.is_on());
/// assert!(!user.is_present());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserState {
    id: String,
    side: Side,
    target_level: i32,
    state: PowerState,
    bed_temperature: f64,
    heart_rate: f64,
    hrv: f64,
    breath_rate: f64,
    sleep_stage: SleepStage,
    last_heart_rate_time: Option<DateTime<Utc>>,
}

impl UserState {
    /// Creates a user state with everything but identity zeroed.
    #[must_use]
    pub fn new(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            side,
            target_level: 0,
            state: PowerState::Off,
            bed_temperature: 0.0,
            heart_rate: 0.0,
            hrv: 0.0,
            breath_rate: 0.0,
            sleep_stage: SleepStage::Unknown,
            last_heart_rate_time: None,
        }
    }

    /// Sets the target level.
    #[must_use]
    pub fn with_target_level(mut self, level: i32) -> Self {
        self.target_level = level;
        self
    }

    /// Sets the power state.
    #[must_use]
    pub fn with_state(mut self, state: PowerState) -> Self {
        self.state = state;
        self
    }

    /// Sets the measured bed temperature.
    #[must_use]
    pub fn with_bed_temperature(mut self, celsius: f64) -> Self {
        self.bed_temperature = celsius;
        self
    }

    /// Sets the heart rate.
    #[must_use]
    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate = bpm;
        self
    }

    /// Sets the heart rate variability.
    #[must_use]
    pub fn with_hrv(mut self, hrv: f64) -> Self {
        self.hrv = hrv;
        self
    }

    /// Sets the breath rate.
    #[must_use]
    pub fn with_breath_rate(mut self, rate: f64) -> Self {
        self.breath_rate = rate;
        self
    }

    /// Sets the sleep stage.
    #[must_use]
    pub fn with_sleep_stage(mut self, stage: SleepStage) -> Self {
        self.sleep_stage = stage;
        self
    }

    /// Sets when the last heart-rate sample was taken.
    #[must_use]
    pub fn with_last_heart_rate_time(mut self, at: DateTime<Utc>) -> Self {
        self.last_heart_rate_time = Some(at);
        self
    }

    /// Backend user identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Side this user occupies.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Target level in `[-100, 100]`.
    #[must_use]
    pub fn target_level(&self) -> i32 {
        self.target_level
    }

    /// Power state.
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Measured bed temperature in degrees Celsius.
    #[must_use]
    pub fn bed_temperature(&self) -> f64 {
        self.bed_temperature
    }

    /// Heart rate in beats per minute.
    #[must_use]
    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    /// Heart rate variability.
    #[must_use]
    pub fn hrv(&self) -> f64 {
        self.hrv
    }

    /// Breaths per minute.
    #[must_use]
    pub fn breath_rate(&self) -> f64 {
        self.breath_rate
    }

    /// Current sleep stage.
    #[must_use]
    pub fn sleep_stage(&self) -> SleepStage {
        self.sleep_stage
    }

    /// Time of the last heart-rate sample, if one was ever observed.
    #[must_use]
    pub fn last_heart_rate_time(&self) -> Option<DateTime<Utc>> {
        self.last_heart_rate_time
    }

    /// Returns `true` when the side is heating or cooling.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Returns `true` if a heart-rate sample was seen within [`PRESENCE_TIMEOUT`].
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.is_present_at(Utc::now())
    }

    /// Presence evaluated against an explicit clock reading.
    ///
    /// A sample timestamped after `now` counts as present.
    #[must_use]
    pub fn is_present_at(&self, now: DateTime<Utc>) -> bool {
        let Some(seen) = self.last_heart_rate_time else {
            return false;
        };
        match now.signed_duration_since(seen).to_std() {
            Ok(elapsed) => elapsed < PRESENCE_TIMEOUT,
            Err(_) => true,
        }
    }
}
