// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP hub server lifecycle.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::HubConfig;
use super::routes::router;
use crate::adapter::{Adapter, Command, execute_command};
use crate::backend::BackendApi;
use crate::error::{ProtocolError, Result};
use crate::manager::StateManager;

struct Running {
    stop: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

/// Request/response adapter for hubs that poll over HTTP.
///
/// Routes are listed in [`routes`](super::routes). The server runs on its
/// own task between [`start`](Adapter::start) and [`stop`](Adapter::stop).
pub struct HubServer<B> {
    config: HubConfig,
    manager: Arc<StateManager<B>>,
    running: Option<Running>,
}

impl<B: BackendApi + 'static> HubServer<B> {
    #[must_use]
    pub fn new(config: HubConfig, manager: Arc<StateManager<B>>) -> Self {
        Self {
            config,
            manager,
            running: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<StateManager<B>> {
        &self.manager
    }

    /// The router served by this adapter, for embedding or in-process tests.
    #[must_use]
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.manager))
    }

    /// Bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<B: BackendApi + 'static> Adapter for HubServer<B> {
    fn name(&self) -> &'static str {
        "hub"
    }

    async fn start(&mut self, shutdown: CancellationToken) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let listener = TcpListener::bind(self.config.bind_address())
            .await
            .map_err(ProtocolError::Io)?;
        let local_addr = listener.local_addr().map_err(ProtocolError::Io)?;

        let stop = shutdown.child_token();
        let signal = stop.clone();
        let app = self.router();
        let mut task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        // A server that fails right away reports it here.
        match tokio::time::timeout(self.config.startup_grace(), &mut task).await {
            Err(_) => {}
            Ok(Ok(Ok(()))) => {
                return Err(ProtocolError::ConnectionFailed(
                    "HTTP server exited during startup".to_string(),
                )
                .into());
            }
            Ok(Ok(Err(e))) => return Err(ProtocolError::Io(e).into()),
            Ok(Err(e)) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "HTTP server task failed: {e}"
                ))
                .into());
            }
        }

        tracing::info!(address = %local_addr, "Hub server listening");
        self.running = Some(Running {
            stop,
            task,
            local_addr,
        });
        Ok(())
    }

    async fn handle_command(&self, command: Command) -> Result<()> {
        execute_command(&self.manager, command).await
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        running.stop.cancel();
        let grace = self.config.shutdown_grace();
        match tokio::time::timeout(grace, &mut running.task).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!(address = %running.local_addr, "Hub server stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(ProtocolError::Io(e).into()),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Hub server task ended abnormally");
                Ok(())
            }
            Err(_) => {
                running.task.abort();
                Err(ProtocolError::Timeout(millis(grace)).into())
            }
        }
    }
}

impl<B> fmt::Debug for HubServer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubServer")
            .field("config", &self.config)
            .field(
                "local_addr",
                &self.running.as_ref().map(|running| running.local_addr),
            )
            .finish_non_exhaustive()
    }
}

impl<B> Drop for HubServer<B> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.cancel();
        }
    }
}
