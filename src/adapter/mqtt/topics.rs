// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic scheme.
//!
//! ```text
//! {prefix}/climate/{device}_{side}/config          discovery (retained)
//! eightsleep/{device}/{side}/temperature           target level (retained)
//! eightsleep/{device}/{side}/mode                  off | heat | cool (retained)
//! eightsleep/{device}/{side}/current_temperature   bed temperature (retained)
//! eightsleep/{device}/availability                 online | offline (retained)
//! eightsleep/{device}/{side}/set_temperature       command: integer level
//! eightsleep/{device}/{side}/set_mode              command: off | heat | cool
//! ```

use crate::types::Side;

/// Root of all state and command topics.
const STATE_ROOT: &str = "eightsleep";

/// Which command topic a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTopic {
    /// `.../set_temperature`
    SetTemperature,
    /// `.../set_mode`
    SetMode,
}

/// Builds the topics for one device.
#[derive(Debug, Clone)]
pub struct Topics {
    prefix: String,
    device_id: String,
}

impl Topics {
    /// Creates the topic set for `device_id` under discovery prefix `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            device_id: device_id.into(),
        }
    }

    fn side_topic(&self, side: Side, leaf: &str) -> String {
        format!("{STATE_ROOT}/{}/{side}/{leaf}", self.device_id)
    }

    /// Discovery config topic for `side`.
    #[must_use]
    pub fn discovery(&self, side: Side) -> String {
        format!("{}/climate/{}_{side}/config", self.prefix, self.device_id)
    }

    /// Target level state topic.
    #[must_use]
    pub fn temperature(&self, side: Side) -> String {
        self.side_topic(side, "temperature")
    }

    /// Mode state topic.
    #[must_use]
    pub fn mode(&self, side: Side) -> String {
        self.side_topic(side, "mode")
    }

    /// Bed temperature state topic.
    #[must_use]
    pub fn current_temperature(&self, side: Side) -> String {
        self.side_topic(side, "current_temperature")
    }

    /// Availability topic, shared by both sides.
    #[must_use]
    pub fn availability(&self) -> String {
        format!("{STATE_ROOT}/{}/availability", self.device_id)
    }

    /// Level command topic.
    #[must_use]
    pub fn set_temperature(&self, side: Side) -> String {
        self.side_topic(side, "set_temperature")
    }

    /// Mode command topic.
    #[must_use]
    pub fn set_mode(&self, side: Side) -> String {
        self.side_topic(side, "set_mode")
    }

    /// All four command topics, left side first.
    #[must_use]
    pub fn command_topics(&self) -> Vec<String> {
        Side::ALL
            .into_iter()
            .flat_map(|side| [self.set_temperature(side), self.set_mode(side)])
            .collect()
    }

    /// Identifies a command topic of this device.
    #[must_use]
    pub fn parse_command(&self, topic: &str) -> Option<(Side, CommandTopic)> {
        let rest = topic
            .strip_prefix(STATE_ROOT)?
            .strip_prefix('/')?
            .strip_prefix(self.device_id.as_str())?
            .strip_prefix('/')?;
        let (side, leaf) = rest.split_once('/')?;
        let side = match side {
            "left" => Side::Left,
            "right" => Side::Right,
            _ => return None,
        };
        let kind = match leaf {
            "set_temperature" => CommandTopic::SetTemperature,
            "set_mode" => CommandTopic::SetMode,
            _ => return None,
        };
        Some((side, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("homeassistant", "pod-1")
    }

    #[test]
    fn topic_layout() {
        let t = topics();
        assert_eq!(
            t.discovery(Side::Left),
            "homeassistant/climate/pod-1_left/config"
        );
        assert_eq!(t.temperature(Side::Right), "eightsleep/pod-1/right/temperature");
        assert_eq!(t.mode(Side::Left), "eightsleep/pod-1/left/mode");
        assert_eq!(
            t.current_temperature(Side::Left),
            "eightsleep/pod-1/left/current_temperature"
        );
        assert_eq!(t.availability(), "eightsleep/pod-1/availability");
    }

    #[test]
    fn command_topics_cover_both_sides() {
        assert_eq!(
            topics().command_topics(),
            vec![
                "eightsleep/pod-1/left/set_temperature",
                "eightsleep/pod-1/left/set_mode",
                "eightsleep/pod-1/right/set_temperature",
                "eightsleep/pod-1/right/set_mode",
            ]
        );
    }

    #[test]
    fn parse_command_recognizes_own_topics() {
        let t = topics();
        assert_eq!(
            t.parse_command("eightsleep/pod-1/right/set_mode"),
            Some((Side::Right, CommandTopic::SetMode))
        );
        assert_eq!(
            t.parse_command("eightsleep/pod-1/left/set_temperature"),
            Some((Side::Left, CommandTopic::SetTemperature))
        );
    }

    #[test]
    fn parse_command_rejects_foreign_topics() {
        let t = topics();
        assert_eq!(t.parse_command("eightsleep/pod-2/left/set_mode"), None);
        assert_eq!(t.parse_command("eightsleep/pod-1/Left/set_mode"), None);
        assert_eq!(t.parse_command("eightsleep/pod-1/left/temperature"), None);
        assert_eq!(t.parse_command("eightsleep/pod-1/availability"), None);
    }
}
