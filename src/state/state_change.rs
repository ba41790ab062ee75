// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications derived from consecutive snapshots.
//!
//! Every successful refresh that replaces an earlier snapshot yields one
//! [`StateChange`], followed by a [`PresenceChange`] for each side whose
//! occupancy flipped between the two snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::Side;

use super::{DeviceState, UserState};

/// A refresh replaced one snapshot with another.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Snapshot before the refresh.
    pub old: Arc<DeviceState>,
    /// Snapshot after the refresh.
    pub new: Arc<DeviceState>,
}

impl StateChange {
    /// Creates a new state change.
    #[must_use]
    pub fn new(old: Arc<DeviceState>, new: Arc<DeviceState>) -> Self {
        Self { old, new }
    }
}

/// Occupancy of one side flipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceChange {
    /// Side whose occupancy changed.
    pub side: Side,
    /// Occupancy after the change.
    pub present: bool,
    /// User on that side in the new snapshot.
    pub user: Option<UserState>,
}

/// Computes presence transitions between two snapshots, left side first.
///
/// A missing user counts as absent.
#[must_use]
pub fn presence_changes(
    old: &DeviceState,
    new: &DeviceState,
    now: DateTime<Utc>,
) -> Vec<PresenceChange> {
    Side::ALL
        .into_iter()
        .filter_map(|side| {
            let was = old.user(side).is_some_and(|u| u.is_present_at(now));
            let user = new.user(side);
            let is = user.is_some_and(|u| u.is_present_at(now));
            (was != is).then(|| PresenceChange {
                side,
                present: is,
                user: user.cloned(),
            })
        })
        .collect()
}
