// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite pod state.

use crate::types::Side;

use super::UserState;

/// State of one pod at the moment it was fetched.
///
/// Users are slotted by their own [`Side`], so a `DeviceState` can never hold
/// a user in the wrong slot.
///
/// # Examples
///
/// ```
/// use eightbridge::state::{DeviceState, UserState};
/// use eightbridge::types::Side;
///
/// let state = DeviceState::new("pod-1")
///     .with_user(UserState::new("u-right", Side::Right));
///
/// assert!(state.user(Side::Left).is_none());
/// assert_eq!(state.user(Side::Right).map(UserState::id), Some("u-right"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DeviceState {
    id: String,
    room_temperature: f64,
    has_water: bool,
    is_priming: bool,
    needs_priming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    left: Option<UserState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    right: Option<UserState>,
}

impl DeviceState {
    /// Creates an empty state for the given device.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the room temperature.
    #[must_use]
    pub fn with_room_temperature(mut self, celsius: f64) -> Self {
        self.room_temperature = celsius;
        self
    }

    /// Sets the water and priming flags.
    #[must_use]
    pub fn with_water(mut self, has_water: bool, is_priming: bool, needs_priming: bool) -> Self {
        self.has_water = has_water;
        self.is_priming = is_priming;
        self.needs_priming = needs_priming;
        self
    }

    /// Places `user` in the slot matching its side, replacing any previous one.
    #[must_use]
    pub fn with_user(mut self, user: UserState) -> Self {
        match user.side() {
            Side::Left => self.left = Some(user),
            Side::Right => self.right = Some(user),
        }
        self
    }

    /// Device identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Room temperature in degrees Celsius.
    #[must_use]
    pub fn room_temperature(&self) -> f64 {
        self.room_temperature
    }

    /// Returns `true` if the reservoir has water.
    #[must_use]
    pub fn has_water(&self) -> bool {
        self.has_water
    }

    /// Returns `true` while the pod is priming.
    #[must_use]
    pub fn is_priming(&self) -> bool {
        self.is_priming
    }

    /// Returns `true` if the pod asks to be primed.
    #[must_use]
    pub fn needs_priming(&self) -> bool {
        self.needs_priming
    }

    /// User on the given side, if one is assigned.
    #[must_use]
    pub fn user(&self, side: Side) -> Option<&UserState> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// Left-side user.
    #[must_use]
    pub fn left(&self) -> Option<&UserState> {
        self.left.as_ref()
    }

    /// Right-side user.
    #[must_use]
    pub fn right(&self) -> Option<&UserState> {
        self.right.as_ref()
    }

    /// Returns `true` if both sides have a user.
    #[must_use]
    pub fn has_both_sides(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}
