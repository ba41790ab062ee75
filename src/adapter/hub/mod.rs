// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP hub adapter.
//!
//! Serves a small JSON API for hubs that poll the pod instead of
//! subscribing to it. All responses, errors included, are JSON.

mod config;
mod error;
pub mod routes;
mod server;

pub use config::{DEFAULT_PORT, DEFAULT_SHUTDOWN_GRACE, DEFAULT_STARTUP_GRACE, HubConfig};
pub use routes::{SideStatus, StatusResponse};
pub use server::HubServer;
