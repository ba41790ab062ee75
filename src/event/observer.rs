// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer trait.

use crate::state::{PresenceChange, StateChange};

/// Receives change notifications from a
/// [`StateManager`](crate::manager::StateManager).
///
/// Callbacks run synchronously on the task that performed the refresh, in
/// registration order, after the manager's lock has been released. Keep them
/// short: hand long work to a channel such as [`EventBus`](super::EventBus).
///
/// Both methods default to doing nothing, so an observer only implements
/// what it needs.
pub trait Observer: Send + Sync {
    /// Called once per refresh that replaced an earlier snapshot.
    fn on_state_change(&self, change: &StateChange) {
        let _ = change;
    }

    /// Called for each side whose occupancy flipped, left side first.
    fn on_presence_change(&self, change: &PresenceChange) {
        let _ = change;
    }
}
