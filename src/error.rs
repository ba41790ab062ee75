// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `eightbridge` library.
//!
//! Failures fall into three families: validation problems detected before
//! any network call, errors reported by the Backend API, and protocol errors
//! raised by the MQTT and HTTP bridges themselves.

use thiserror::Error;

use crate::types::Side;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was rejected before reaching the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The Backend API reported a failure.
    ///
    /// Displayed verbatim so callers see the backend's own text.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A bridge protocol (MQTT or HTTP) failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Error {
    /// Returns `true` if this error was raised by input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if retrying the same operation could succeed.
    ///
    /// Validation errors are never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Backend(err) => err.is_retryable(),
            Self::Protocol(err) => !matches!(
                err,
                ProtocolError::InvalidAddress(_) | ProtocolError::Payload(_)
            ),
        }
    }
}

/// Errors raised when a request is rejected before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The command action is not one of `on`, `off`, `set_temperature`.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A `set_temperature` command was issued without a temperature.
    #[error("temperature required for set_temperature action")]
    MissingTemperature,

    /// A heating level outside `[-100, 100]`.
    #[error("invalid level {0}: must be between -100 and 100")]
    LevelOutOfRange(i32),

    /// The requested side has no user assigned on the device.
    #[error("no user assigned to {0} side")]
    NoUserAssigned(Side),

    /// A side name other than `left` or `right`.
    #[error("invalid side: must be 'left' or 'right'")]
    InvalidSide(String),

    /// A level that is not an integer.
    #[error("invalid level: must be an integer")]
    InvalidLevel(String),
}

/// Errors reported by the Backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport failure.
    #[cfg(feature = "cloud")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The backend answered with a body that could not be decoded.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// The backend could not be reached or refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Returns `true` for transport failures and server-side statuses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "cloud")]
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidResponse(_) => false,
            Self::Unavailable(_) => true,
        }
    }
}

/// Errors raised by the bridge protocols.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Binding or serving a network listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A payload could not be serialized.
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_user_assigned_display() {
        let err = ValidationError::NoUserAssigned(Side::Right);
        assert_eq!(err.to_string(), "no user assigned to right side");
    }

    #[test]
    fn level_out_of_range_display() {
        let err: Error = ValidationError::LevelOutOfRange(150).into();
        assert_eq!(
            err.to_string(),
            "invalid level 150: must be between -100 and 100"
        );
    }

    #[test]
    fn backend_error_is_transparent() {
        let err: Error = BackendError::Unavailable("connection refused".to_string()).into();
        assert_eq!(err.to_string(), "backend unavailable: connection refused");
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err: Error = ValidationError::MissingTemperature.into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_status_is_retryable() {
        let err: Error = BackendError::Status {
            status: 503,
            body: String::new(),
        }
        .into();
        assert!(err.is_retryable());

        let err: Error = BackendError::Status {
            status: 404,
            body: String::new(),
        }
        .into();
        assert!(!err.is_retryable());
    }
}
