// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting state events.

use tokio::sync::broadcast;

use super::Observer;
use crate::state::{PresenceChange, StateChange};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A notification carried by the [`EventBus`].
#[derive(Debug, Clone)]
pub enum StateEvent {
    /// A refresh replaced the cached snapshot.
    StateChanged(StateChange),
    /// A side's occupancy flipped.
    PresenceChanged(PresenceChange),
}

/// Event bus for broadcasting state events to multiple subscribers.
///
/// The bus is an [`Observer`]: register it on a manager and every
/// notification is re-published on a tokio broadcast channel. Publishing
/// never blocks the refresh that produced it.
///
/// # Capacity
///
/// The event bus has a fixed capacity (default 256). If the channel fills
/// up because a subscriber is slow, older events may be dropped for that
/// subscriber (they will receive a `RecvError::Lagged` error).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use eightbridge::event::{EventBus, StateEvent};
/// use eightbridge::state::{DeviceState, StateChange};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// let snapshot = Arc::new(DeviceState::new("pod-1"));
/// bus.publish(StateEvent::StateChanged(StateChange::new(
///     snapshot.clone(),
///     snapshot,
/// )));
///
/// assert!(matches!(rx.try_recv(), Ok(StateEvent::StateChanged(_))));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StateEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events that can be buffered
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to state events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// If there are no subscribers, the event is silently discarded.
    pub fn publish(&self, event: StateEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for EventBus {
    fn on_state_change(&self, change: &StateChange) {
        self.publish(StateEvent::StateChanged(change.clone()));
    }

    fn on_presence_change(&self, change: &PresenceChange) {
        self.publish(StateEvent::PresenceChanged(change.clone()));
    }
}
