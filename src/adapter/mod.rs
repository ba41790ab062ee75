// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart-home bridges.
//!
//! An [`Adapter`] exposes a [`StateManager`] to a home-automation platform.
//! Two adapters ship with the crate:
//!
//! - [`mqtt::MqttBridge`] (feature `mqtt`): MQTT discovery bridge for hubs
//!   such as Home Assistant
//! - [`hub::HubServer`] (feature `hub`): HTTP control server for hubs that
//!   poll REST endpoints
//!
//! Both route commands through [`execute_command`], so a command means the
//! same thing whichever bridge it arrives on.

#[cfg(feature = "hub")]
pub mod hub;
#[cfg(feature = "mqtt")]
pub mod mqtt;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::backend::BackendApi;
use crate::error::{Result, ValidationError};
use crate::manager::StateManager;
use crate::types::Side;

/// What a [`Command`] asks the pod to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Turn the side on.
    On,
    /// Turn the side off.
    Off,
    /// Set the side's target level.
    SetTemperature,
}

impl Action {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::SetTemperature => "set_temperature",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "set_temperature" => Ok(Self::SetTemperature),
            _ => Err(ValidationError::UnknownAction(s.to_string())),
        }
    }
}

/// A command received from a home-automation platform.
///
/// # Examples
///
/// ```
/// use eightbridge::adapter::{Action, Command};
/// use eightbridge::types::Side;
///
/// let cmd = Command::set_temperature(Side::Left, -20);
/// assert_eq!(cmd.action, Action::SetTemperature);
/// assert_eq!(cmd.temperature, Some(-20));
///
/// let cmd = Command::new("off".parse().unwrap(), Side::Right);
/// assert_eq!(cmd.temperature, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Requested action.
    pub action: Action,
    /// Target side.
    pub side: Side,
    /// Target level, only meaningful for [`Action::SetTemperature`].
    pub temperature: Option<i32>,
}

impl Command {
    /// Creates a command without a temperature.
    #[must_use]
    pub fn new(action: Action, side: Side) -> Self {
        Self {
            action,
            side,
            temperature: None,
        }
    }

    /// Turn `side` on.
    #[must_use]
    pub fn on(side: Side) -> Self {
        Self::new(Action::On, side)
    }

    /// Turn `side` off.
    #[must_use]
    pub fn off(side: Side) -> Self {
        Self::new(Action::Off, side)
    }

    /// Set `side` to `level`.
    #[must_use]
    pub fn set_temperature(side: Side, level: i32) -> Self {
        Self {
            action: Action::SetTemperature,
            side,
            temperature: Some(level),
        }
    }
}

/// A bridge between a [`StateManager`] and a home-automation platform.
pub trait Adapter: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Starts background work.
    ///
    /// Returns once the adapter is running, or fails fast if it cannot
    /// start. Cancelling `shutdown` stops background work the same way as
    /// [`stop`](Self::stop) signals it.
    fn start(&mut self, shutdown: CancellationToken) -> impl Future<Output = Result<()>> + Send;

    /// Executes a command against the pod.
    fn handle_command(&self, command: Command) -> impl Future<Output = Result<()>> + Send;

    /// Releases resources.
    ///
    /// A no-op if the adapter was never started, failed to start, or has
    /// already been stopped.
    fn stop(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Runs `command` against `manager`.
///
/// # Errors
///
/// Returns `ValidationError::MissingTemperature` for a `SetTemperature`
/// command without a level, otherwise whatever the manager returns.
pub async fn execute_command<B: BackendApi>(
    manager: &StateManager<B>,
    command: Command,
) -> Result<()> {
    tracing::debug!(action = %command.action, side = %command.side, "Executing command");
    match command.action {
        Action::On => manager.turn_on(command.side).await,
        Action::Off => manager.turn_off(command.side).await,
        Action::SetTemperature => {
            let level = command
                .temperature
                .ok_or(ValidationError::MissingTemperature)?;
            manager.set_temperature(command.side, level).await
        }
    }
}
