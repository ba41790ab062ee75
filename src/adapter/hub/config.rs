// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Time a freshly started server is watched for bind or serve failures.
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_millis(100);

/// Upper bound on graceful shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Configuration of the HTTP hub adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    bind_address: SocketAddr,
    startup_grace: Duration,
    shutdown_grace: Duration,
}

impl HubConfig {
    /// Listens on all interfaces at `port`.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], port)),
            startup_grace: DEFAULT_STARTUP_GRACE,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Listens on a specific address. Port `0` picks a free port.
    #[must_use]
    pub fn with_bind_address(mut self, address: SocketAddr) -> Self {
        self.bind_address = address;
        self
    }

    #[must_use]
    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    #[must_use]
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    #[must_use]
    pub fn startup_grace(&self) -> Duration {
        self.startup_grace
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}
