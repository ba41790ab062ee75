// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT bridge configuration.

use std::time::Duration;

use crate::error::ProtocolError;

/// Configuration for an [`MqttBridge`](super::MqttBridge).
///
/// # Examples
///
/// ```
/// use eightbridge::adapter::mqtt::MqttBridgeConfig;
/// use std::time::Duration;
///
/// let config = MqttBridgeConfig::new("tcp://192.168.1.10:1883", "pod-1")
///     .with_credentials("bridge", "secret")
///     .with_device_name("Bedroom Pod")
///     .with_poll_interval(Duration::from_secs(60));
///
/// assert_eq!(config.topic_prefix(), "homeassistant");
/// assert_eq!(config.broker_address().unwrap(), ("192.168.1.10".to_string(), 1883));
/// ```
#[derive(Clone)]
pub struct MqttBridgeConfig {
    broker_url: String,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    topic_prefix: String,
    device_id: String,
    device_name: String,
    poll_interval: Duration,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_interval: Duration,
}

impl MqttBridgeConfig {
    /// Default broker port.
    pub const DEFAULT_PORT: u16 = 1883;
    /// Default discovery topic prefix.
    pub const DEFAULT_TOPIC_PREFIX: &'static str = "homeassistant";
    /// Default device name shown by the hub.
    pub const DEFAULT_DEVICE_NAME: &'static str = "Eight Sleep Pod";
    /// Default interval between state polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
    /// Shortest accepted interval between state polls.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Default MQTT keep-alive.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
    /// Default bound on the initial connection.
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default delay between reconnection attempts.
    pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

    /// Creates a configuration for `device_id` on the broker at `broker_url`.
    ///
    /// The URL may be `mqtt://host:port`, `tcp://host:port` or `host[:port]`.
    #[must_use]
    pub fn new(broker_url: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            credentials: None,
            client_id: None,
            topic_prefix: Self::DEFAULT_TOPIC_PREFIX.to_string(),
            device_id: device_id.into(),
            device_name: Self::DEFAULT_DEVICE_NAME.to_string(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            reconnect_interval: Self::DEFAULT_RECONNECT_INTERVAL,
        }
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets a fixed MQTT client id instead of a generated one.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the discovery topic prefix.
    #[must_use]
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Sets the device name shown by the hub.
    #[must_use]
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Sets the interval between state polls.
    ///
    /// Values below [`MIN_POLL_INTERVAL`](Self::MIN_POLL_INTERVAL) are raised
    /// to it.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Self::MIN_POLL_INTERVAL);
        self
    }

    /// Sets the MQTT keep-alive.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the bound on the initial connection.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the delay between reconnection attempts.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Returns the broker URL as given.
    #[must_use]
    pub fn broker_url(&self) -> &str {
        &self.broker_url
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the configured client id, if one was set.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Returns the discovery topic prefix.
    #[must_use]
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Returns the device id.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the device name.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the keep-alive.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns the initial connection bound.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Returns the reconnection delay.
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Splits the broker URL into host and port.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the host is empty or the
    /// port is not a number.
    pub fn broker_address(&self) -> Result<(String, u16), ProtocolError> {
        parse_broker_url(&self.broker_url)
    }

    /// Client id to connect with: the configured one or a fresh unique id.
    pub(crate) fn resolve_client_id(&self) -> String {
        match &self.client_id {
            Some(id) => id.clone(),
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                format!("eightbridge_{}", &id[..8])
            }
        }
    }
}

impl std::fmt::Debug for MqttBridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridgeConfig")
            .field("broker_url", &self.broker_url)
            .field("has_credentials", &self.credentials.is_some())
            .field("client_id", &self.client_id)
            .field("topic_prefix", &self.topic_prefix)
            .field("device_id", &self.device_id)
            .field("device_name", &self.device_name)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

fn parse_broker_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h, port)
    } else {
        (url, MqttBridgeConfig::DEFAULT_PORT)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(
            "MQTT broker host is required".to_string(),
        ));
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_url_with_port() {
        assert_eq!(
            parse_broker_url("mqtt://192.168.1.50:1884").unwrap(),
            ("192.168.1.50".to_string(), 1884)
        );
    }

    #[test]
    fn broker_url_default_port() {
        assert_eq!(
            parse_broker_url("tcp://localhost").unwrap(),
            ("localhost".to_string(), 1883)
        );
    }

    #[test]
    fn broker_url_bad_port() {
        assert!(matches!(
            parse_broker_url("broker:abc"),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn broker_url_empty_host() {
        assert!(parse_broker_url("tcp://:1883").is_err());
    }

    #[test]
    fn defaults() {
        let config = MqttBridgeConfig::new("tcp://localhost:1883", "pod");
        assert_eq!(config.device_name(), "Eight Sleep Pod");
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.reconnect_interval(), Duration::from_secs(5));
        assert!(config.client_id().is_none());
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config =
            MqttBridgeConfig::new("tcp://localhost:1883", "pod").with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval(), MqttBridgeConfig::MIN_POLL_INTERVAL);

        let config = MqttBridgeConfig::new("tcp://localhost:1883", "pod")
            .with_poll_interval(Duration::from_millis(200));
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn generated_client_ids_are_unique() {
        let config = MqttBridgeConfig::new("localhost", "pod");
        let a = config.resolve_client_id();
        let b = config.resolve_client_id();
        assert!(a.starts_with("eightbridge_"));
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_client_id_is_used() {
        let config = MqttBridgeConfig::new("localhost", "pod").with_client_id("eightctl");
        assert_eq!(config.resolve_client_id(), "eightctl");
    }

    #[test]
    fn debug_hides_password() {
        let config = MqttBridgeConfig::new("localhost", "pod").with_credentials("u", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
