// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bed side addressing.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// One half of a two-zone pod.
///
/// # Examples
///
/// ```
/// use eightbridge::types::Side;
///
/// let side: Side = "LEFT".parse().unwrap();
/// assert_eq!(side, Side::Left);
/// assert_eq!(side.as_str(), "left");
/// assert!("middle".parse::<Side>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left half of the bed.
    Left,
    /// Right half of the bed.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Returns the wire name (`left` or `right`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }
}
