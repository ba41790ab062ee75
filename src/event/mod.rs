// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notification.
//!
//! Anything implementing [`Observer`] can be registered on a
//! [`StateManager`](crate::manager::StateManager). Two observers ship with
//! the crate: [`EventBus`], which re-publishes notifications on a tokio
//! broadcast channel, and [`LoggingObserver`], which traces them.
//!
//! # Examples
//!
//! ```
//! use eightbridge::event::{EventBus, Observer};
//! use eightbridge::state::PresenceChange;
//! use eightbridge::types::Side;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.on_presence_change(&PresenceChange {
//!     side: Side::Left,
//!     present: true,
//!     user: None,
//! });
//!
//! assert!(rx.try_recv().is_ok());
//! ```

mod event_bus;
mod logging_observer;
mod observer;

pub use event_bus::{EventBus, StateEvent};
pub use logging_observer::LoggingObserver;
pub use observer::Observer;
