// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST client for the vendor cloud.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;

use super::{BackendApi, DeviceWithUsers, UserTemperature};
use crate::error::BackendError;
use crate::types::{Level, PowerState};

// ============================================================================
// CloudConfig
// ============================================================================

/// Configuration for a [`CloudClient`].
///
/// # Examples
///
/// ```
/// use eightbridge::backend::CloudConfig;
/// use std::time::Duration;
///
/// let config = CloudConfig::new("access-token")
///     .with_base_url("http://127.0.0.1:9000")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://127.0.0.1:9000");
/// ```
#[derive(Clone)]
pub struct CloudConfig {
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl CloudConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://client-api.8slp.net/v1";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration authenticating with `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the API base URL. A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a [`CloudClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<CloudClient, BackendError> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(CloudClient {
            base_url: self.base_url,
            access_token: self.access_token,
            client,
        })
    }
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DeviceEnvelope {
    result: DeviceResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeviceResult {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    left_user_id: Option<String>,
    right_user_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    room_temperature: f64,
    #[serde(deserialize_with = "null_as_default")]
    water_level: i32,
    #[serde(deserialize_with = "null_as_default")]
    priming: Priming,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Priming {
    #[serde(deserialize_with = "null_as_default")]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemperatureResult {
    current_level: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    current_state: CurrentState,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurrentState {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    kind: String,
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unassigned sides come back as a missing key, `null` or `""`.
fn assigned(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.is_empty())
}

impl From<DeviceResult> for DeviceWithUsers {
    fn from(result: DeviceResult) -> Self {
        Self {
            id: result.id,
            left_user_id: assigned(result.left_user_id),
            right_user_id: assigned(result.right_user_id),
            room_temperature: result.room_temperature,
            water_level: result.water_level,
            is_priming: result.priming.status == "priming",
            needs_priming: result.priming.status == "needed",
        }
    }
}

impl From<TemperatureResult> for UserTemperature {
    fn from(result: TemperatureResult) -> Self {
        Self {
            current_level: result.current_level,
            current_state: PowerState::from_backend(&result.current_state.kind),
        }
    }
}

// ============================================================================
// CloudClient
// ============================================================================

/// [`BackendApi`] implementation over the vendor REST API.
///
/// The client authenticates with a bearer token supplied by the caller;
/// obtaining and refreshing that token is left to the host application.
///
/// # Examples
///
/// ```no_run
/// use eightbridge::backend::{BackendApi, CloudConfig};
///
/// # async fn example() -> Result<(), eightbridge::error::BackendError> {
/// let client = CloudConfig::new("access-token").into_client()?;
/// let device = client.fetch_device_with_users("pod-1").await?;
/// println!("left user: {:?}", device.left_user_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CloudClient {
    base_url: String,
    access_token: String,
    client: Client,
}

impl CloudClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> Result<Self, BackendError> {
        CloudConfig::new(access_token).into_client()
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%method, url = %url, "Sending backend request");
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Backend request failed");
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let bytes = Self::check(response).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BackendApi for CloudClient {
    async fn fetch_device_with_users(
        &self,
        device_id: &str,
    ) -> Result<DeviceWithUsers, BackendError> {
        let path = format!("/devices/{}", urlencoding::encode(device_id));
        let response = self
            .request(Method::GET, &path)
            .query(&[("filter", "leftUserId,rightUserId,awaySides")])
            .send()
            .await?;
        let envelope: DeviceEnvelope = Self::decode(response).await?;
        Ok(envelope.result.into())
    }

    async fn fetch_user_temperature(&self, user_id: &str) -> Result<UserTemperature, BackendError> {
        let path = format!("/users/{}/temperature", urlencoding::encode(user_id));
        let response = self.request(Method::GET, &path).send().await?;
        let result: TemperatureResult = Self::decode(response).await?;
        Ok(result.into())
    }

    async fn set_user_temperature(&self, user_id: &str, level: Level) -> Result<(), BackendError> {
        let path = format!("/users/{}/temperature", urlencoding::encode(user_id));
        let response = self
            .request(Method::PUT, &path)
            .json(&serde_json::json!({ "currentLevel": level.value() }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn set_user_power(&self, user_id: &str, on: bool) -> Result<(), BackendError> {
        let path = format!("/users/{}/devices/power", urlencoding::encode(user_id));
        let response = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "on": on }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
