// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer that writes notifications to `tracing`.

use super::Observer;
use crate::state::{PresenceChange, StateChange};
use crate::types::Side;

/// Logs every notification it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    /// Creates a new logging observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LoggingObserver {
    fn on_state_change(&self, change: &StateChange) {
        for side in Side::ALL {
            let old = change.old.user(side);
            let new = change.new.user(side);
            let old_level = old.map(|u| u.target_level());
            let new_level = new.map(|u| u.target_level());
            let old_on = old.map(|u| u.is_on());
            let new_on = new.map(|u| u.is_on());
            if old_level != new_level || old_on != new_on {
                tracing::info!(
                    device_id = %change.new.id(),
                    %side,
                    ?old_level,
                    ?new_level,
                    ?old_on,
                    ?new_on,
                    "Side state changed"
                );
            }
        }
        tracing::debug!(device_id = %change.new.id(), "Device state refreshed");
    }

    fn on_presence_change(&self, change: &PresenceChange) {
        tracing::info!(
            side = %change.side,
            present = change.present,
            user_id = change.user.as_ref().map(|u| u.id()),
            "Presence changed"
        );
    }
}
