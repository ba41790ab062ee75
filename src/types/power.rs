// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of one side of the pod.

use std::fmt;

/// Heating/cooling power state reported by the backend.
///
/// # Examples
///
/// ```
/// use eightbridge::types::PowerState;
///
/// assert_eq!(PowerState::from_backend("smart"), PowerState::Smart);
/// assert_eq!(PowerState::from_backend("off"), PowerState::Off);
/// // Anything unrecognized reads as off.
/// assert_eq!(PowerState::from_backend("paused"), PowerState::Off);
/// assert!(PowerState::Manual.is_on());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Not heating or cooling.
    #[default]
    Off,
    /// Following the user's smart schedule.
    Smart,
    /// Holding a manually set level.
    Manual,
}

impl PowerState {
    /// Parses the backend's state string.
    ///
    /// Case-insensitive. `smart` and `manual` map to their variants; every
    /// other value, including `off` and the empty string, maps to
    /// [`PowerState::Off`].
    #[must_use]
    pub fn from_backend(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "smart" => Self::Smart,
            "manual" => Self::Manual,
            _ => Self::Off,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Smart => "smart",
            Self::Manual => "manual",
        }
    }

    /// Returns `true` for `Smart` and `Manual`.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::Smart | Self::Manual)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
