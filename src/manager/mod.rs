// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State management for one pod.
//!
//! The [`StateManager`] sits between the bridges and the Backend API:
//!
//! - **Caching**: snapshots are served for a configurable TTL (30 s by default)
//! - **Mutations**: temperature and power changes go to the backend and
//!   invalidate the cache
//! - **Notification**: observers hear about every refresh and every
//!   occupancy transition
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use eightbridge::backend::CloudClient;
//! use eightbridge::manager::{ManagerConfig, StateManager};
//!
//! # async fn example() -> eightbridge::Result<()> {
//! let config = ManagerConfig::default().with_cache_ttl(Duration::from_secs(10));
//! let manager = StateManager::with_config(CloudClient::new("token")?, "pod-1", config);
//!
//! let state = manager.get_state().await?;
//! println!("room: {:.1}", state.room_temperature());
//! # Ok(())
//! # }
//! ```

mod manager_config;
mod state_manager;

pub use manager_config::ManagerConfig;
pub use state_manager::StateManager;
