// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pod state snapshots.
//!
//! A [`DeviceState`] is produced by one refresh of the
//! [`StateManager`](crate::manager::StateManager) and never mutated after
//! that. Consecutive snapshots are compared to produce [`StateChange`] and
//! [`PresenceChange`] notifications.
//!
//! # Examples
//!
//! ```
//! use eightbridge::state::{DeviceState, UserState};
//! use eightbridge::types::{PowerState, Side};
//!
//! let state = DeviceState::new("pod-1")
//!     .with_user(
//!         UserState::new("u-left", Side::Left)
//!             .with_target_level(-20)
//!             .with_state(PowerState::Smart),
//!     );
//!
//! let left = state.user(Side::Left).unwrap();
//! assert!(left.is_on());
//! assert_eq!(left.target_level(), -20);
//! ```

mod device_state;
mod state_change;
mod user_state;

pub use device_state::DeviceState;
pub use state_change::{PresenceChange, StateChange, presence_changes};
pub use user_state::{PRESENCE_TIMEOUT, UserState};
