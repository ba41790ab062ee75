// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT discovery bridge.
//!
//! Each side of the pod is announced to the hub as a climate entity through
//! a retained discovery config. State is published retained with QoS 1 and
//! refreshed on a fixed interval; commands arrive on per-side topics. See
//! [`Topics`] for the full topic layout.

mod bridge;
mod config;
mod discovery;
mod mode;
mod topics;

pub use bridge::MqttBridge;
pub use config::MqttBridgeConfig;
pub use discovery::{ClimateDiscovery, DeviceInfo, discovery_configs};
pub use mode::{ClimateMode, climate_mode};
pub use topics::{CommandTopic, Topics};
