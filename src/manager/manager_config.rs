// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State manager configuration.

use std::time::Duration;

/// Configuration for a [`StateManager`](super::StateManager).
///
/// # Examples
///
/// ```
/// use eightbridge::manager::ManagerConfig;
/// use std::time::Duration;
///
/// let config = ManagerConfig::default().with_cache_ttl(Duration::from_secs(5));
/// assert_eq!(config.cache_ttl(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    cache_ttl: Duration,
}

impl ManagerConfig {
    /// Default cache time-to-live.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

    /// Sets how long a snapshot is served before the next read refreshes it.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Returns the cache time-to-live.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Self::DEFAULT_CACHE_TTL,
        }
    }
}
