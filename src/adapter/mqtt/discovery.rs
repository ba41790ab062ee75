// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Climate entity discovery payloads.

use serde::Serialize;

use super::{ClimateMode, Topics};
use crate::types::{Level, Side};

/// Device registry entry shared by both sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Registry identifiers; the pod's device id.
    pub identifiers: Vec<String>,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
}

/// Discovery config of one climate entity (one side of the pod).
///
/// Levels stand in for temperatures, so the range is `[-100, 100]` in steps
/// of one. The hub requires a unit; `C` is advertised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateDiscovery {
    /// Entity name, `"{device name} {side}"`.
    pub name: String,
    /// Stable id, `eightsleep_{device}_{side}`.
    pub unique_id: String,
    /// Device registry entry.
    pub device: DeviceInfo,
    /// Topic the hub reads the current temperature from.
    pub current_temperature_topic: String,
    /// Topic the hub reads the target temperature from.
    pub temperature_state_topic: String,
    /// Topic the hub reads the mode from.
    pub mode_state_topic: String,
    /// Availability topic.
    pub availability_topic: String,
    /// Topic the hub publishes target levels to.
    pub temperature_command_topic: String,
    /// Topic the hub publishes modes to.
    pub mode_command_topic: String,
    /// Lowest level.
    pub min_temp: f64,
    /// Highest level.
    pub max_temp: f64,
    /// Level increment.
    pub temp_step: f64,
    /// Advertised unit.
    pub temperature_unit: String,
    /// Supported modes.
    pub modes: Vec<String>,
}

impl ClimateDiscovery {
    /// Builds the discovery config for `side`.
    #[must_use]
    pub fn new(topics: &Topics, device_id: &str, device_name: &str, side: Side) -> Self {
        Self {
            name: format!("{device_name} {side}"),
            unique_id: format!("eightsleep_{device_id}_{side}"),
            device: DeviceInfo {
                identifiers: vec![device_id.to_string()],
                name: device_name.to_string(),
                manufacturer: "Eight Sleep".to_string(),
                model: "Pod".to_string(),
            },
            // Points at the level topic: bed temperature is only known
            // when a telemetry feed is configured.
            current_temperature_topic: topics.temperature(side),
            temperature_state_topic: topics.temperature(side),
            mode_state_topic: topics.mode(side),
            availability_topic: topics.availability(),
            temperature_command_topic: topics.set_temperature(side),
            mode_command_topic: topics.set_mode(side),
            min_temp: f64::from(Level::MIN.value()),
            max_temp: f64::from(Level::MAX.value()),
            temp_step: 1.0,
            temperature_unit: "C".to_string(),
            modes: ClimateMode::ALL
                .iter()
                .map(|mode| mode.as_str().to_string())
                .collect(),
        }
    }
}

/// Discovery configs for both sides, left first.
#[must_use]
pub fn discovery_configs(
    topics: &Topics,
    device_id: &str,
    device_name: &str,
) -> [(Side, ClimateDiscovery); 2] {
    Side::ALL.map(|side| (side, ClimateDiscovery::new(topics, device_id, device_name, side)))
}
