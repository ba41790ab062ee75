// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `eightbridge` - Eight Sleep pod state and smart-home bridges.
//!
//! This library keeps a cached, observable view of one Eight Sleep pod and
//! exposes it to home-automation platforms.
//!
//! # Components
//!
//! - **State manager**: TTL-cached snapshots of the pod, temperature and
//!   power control per side, observer notification on every refresh
//! - **Observers**: synchronous fan-out to [`Observer`]s, with a broadcast
//!   [`EventBus`] and a tracing [`LoggingObserver`] built in
//! - **Backend**: the [`BackendApi`] trait and, behind the `cloud` feature,
//!   a REST [`CloudClient`](backend::CloudClient)
//! - **Adapters**: an MQTT discovery bridge (feature `mqtt`) and an HTTP
//!   hub server (feature `hub`), both driven through the [`Adapter`] trait
//!
//! # Quick Start
//!
//! ## Reading and controlling the pod
//!
//! ```no_run
//! use eightbridge::backend::CloudClient;
//! use eightbridge::manager::StateManager;
//! use eightbridge::types::Side;
//!
//! #[tokio::main]
//! async fn main() -> eightbridge::Result<()> {
//!     let manager = StateManager::new(CloudClient::new("access-token")?, "pod-1");
//!
//!     let state = manager.get_state().await?;
//!     if let Some(left) = state.left() {
//!         println!("left: level {} on={}", left.target_level(), left.is_on());
//!     }
//!
//!     manager.set_temperature(Side::Left, -20).await?;
//!     manager.turn_on(Side::Left).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Bridging to an MQTT hub
//!
//! ```no_run
//! use std::sync::Arc;
//! use eightbridge::Adapter;
//! use eightbridge::adapter::mqtt::{MqttBridge, MqttBridgeConfig};
//! use eightbridge::backend::CloudClient;
//! use eightbridge::manager::StateManager;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> eightbridge::Result<()> {
//!     let manager = Arc::new(StateManager::new(CloudClient::new("access-token")?, "pod-1"));
//!     let config = MqttBridgeConfig::new("mqtt://192.168.1.50:1883", "pod-1");
//!
//!     let shutdown = CancellationToken::new();
//!     let mut bridge = MqttBridge::new(config, manager);
//!     bridge.start(shutdown.clone()).await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     shutdown.cancel();
//!     bridge.stop().await
//! }
//! ```

pub mod adapter;
pub mod backend;
pub mod error;
pub mod event;
pub mod manager;
pub mod state;
pub mod types;

pub use adapter::{Action, Adapter, Command, execute_command};
pub use backend::BackendApi;
pub use error::{BackendError, Error, ProtocolError, Result, ValidationError};
pub use event::{EventBus, LoggingObserver, Observer, StateEvent};
pub use manager::{ManagerConfig, StateManager};
pub use state::{DeviceState, PresenceChange, StateChange, UserState};
pub use types::{Level, PowerState, Side, SleepStage};
