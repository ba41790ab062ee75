// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate mode as seen by the hub.

use std::fmt;

use crate::types::PowerState;

/// HVAC mode of a climate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateMode {
    /// Side is off.
    Off,
    /// Side is on at a level of zero or above.
    Heat,
    /// Side is on at a negative level.
    Cool,
}

impl ClimateMode {
    /// Every mode, in the order advertised in discovery.
    pub const ALL: [Self; 3] = [Self::Off, Self::Heat, Self::Cool];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }

    /// Parses a mode command payload: trimmed, case-insensitive.
    #[must_use]
    pub fn parse_payload(payload: &str) -> Option<Self> {
        match payload.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "heat" => Some(Self::Heat),
            "cool" => Some(Self::Cool),
            _ => None,
        }
    }
}

impl fmt::Display for ClimateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a power state and level to a climate mode.
///
/// ```
/// use eightbridge::adapter::mqtt::{ClimateMode, climate_mode};
/// use eightbridge::types::PowerState;
///
/// assert_eq!(climate_mode(PowerState::Off, 50), ClimateMode::Off);
/// assert_eq!(climate_mode(PowerState::Smart, 0), ClimateMode::Heat);
/// assert_eq!(climate_mode(PowerState::Manual, -1), ClimateMode::Cool);
/// ```
#[must_use]
pub fn climate_mode(state: PowerState, level: i32) -> ClimateMode {
    match state {
        PowerState::Off => ClimateMode::Off,
        PowerState::Smart | PowerState::Manual if level >= 0 => ClimateMode::Heat,
        PowerState::Smart | PowerState::Manual => ClimateMode::Cool,
    }
}
