// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heating/cooling level type.
//!
//! Levels are signed intensities: negative values cool, positive values heat.
//! The type guarantees its value is within `[-100, 100]`.

use std::fmt;

use crate::error::ValidationError;

/// A validated heating/cooling level.
///
/// # Examples
///
/// ```
/// use eightbridge::types::Level;
///
/// let level = Level::new(-20).unwrap();
/// assert_eq!(level.value(), -20);
///
/// assert!(Level::new(101).is_err());
/// assert!(Level::new(-101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize,
)]
pub struct Level(i32);

impl Level {
    /// Coldest level.
    pub const MIN: Self = Self(-100);

    /// Warmest level.
    pub const MAX: Self = Self(100);

    /// Creates a new level.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LevelOutOfRange` if `value` is outside
    /// `[-100, 100]`.
    pub fn new(value: i32) -> Result<Self, ValidationError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&value) {
            return Err(ValidationError::LevelOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// Returns `true` for levels that heat (zero counts as heating).
    #[must_use]
    pub const fn is_heating(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Level {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for i32 {
    fn from(level: Level) -> Self {
        level.0
    }
}
