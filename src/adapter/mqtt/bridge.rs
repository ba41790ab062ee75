// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT discovery bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{ClimateMode, CommandTopic, MqttBridgeConfig, Topics, climate_mode, discovery_configs};
use crate::adapter::{Adapter, Command, execute_command};
use crate::backend::BackendApi;
use crate::error::{ProtocolError, Result};
use crate::manager::StateManager;
use crate::types::Side;

/// Budget for one command including the state republish that follows it.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Budget for one poll-triggered republish.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `stop` waits for the connection task to flush the disconnect.
const DISCONNECT_LINGER: Duration = Duration::from_secs(1);

/// Capacity of the client request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

const ONLINE: &str = "online";
const OFFLINE: &str = "offline";

/// State shared with the background tasks.
struct Shared<B> {
    config: MqttBridgeConfig,
    topics: Topics,
    manager: Arc<StateManager<B>>,
    connected: AtomicBool,
}

/// Handles owned while the bridge runs.
struct Running {
    client: AsyncClient,
    poll_stop: CancellationToken,
    close: CancellationToken,
    poll_task: JoinHandle<()>,
    connection_task: JoinHandle<()>,
}

/// Exposes a pod to an MQTT hub as two climate entities.
///
/// On start the bridge publishes retained discovery configs, the current
/// state of every assigned side and `online` availability, then subscribes
/// to the command topics and polls the [`StateManager`] every
/// [`poll_interval`](MqttBridgeConfig::poll_interval). Lost connections are
/// retried indefinitely; each reconnection republishes discovery and
/// availability and resubscribes.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use eightbridge::adapter::Adapter;
/// use eightbridge::adapter::mqtt::{MqttBridge, MqttBridgeConfig};
/// use eightbridge::backend::CloudClient;
/// use eightbridge::manager::StateManager;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> eightbridge::Result<()> {
/// let manager = Arc::new(StateManager::new(CloudClient::new("token")?, "pod-1"));
/// let config = MqttBridgeConfig::new("tcp://localhost:1883", "pod-1");
///
/// let mut bridge = MqttBridge::new(config, manager);
/// bridge.start(CancellationToken::new()).await?;
/// // ...
/// bridge.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct MqttBridge<B> {
    shared: Arc<Shared<B>>,
    running: Option<Running>,
}

impl<B: BackendApi + 'static> MqttBridge<B> {
    /// Creates a bridge; nothing connects until [`start`](Adapter::start).
    #[must_use]
    pub fn new(config: MqttBridgeConfig, manager: Arc<StateManager<B>>) -> Self {
        let topics = Topics::new(config.topic_prefix(), config.device_id());
        Self {
            shared: Arc::new(Shared {
                config,
                topics,
                manager,
                connected: AtomicBool::new(false),
            }),
            running: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MqttBridgeConfig {
        &self.shared.config
    }

    /// Returns the state manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<StateManager<B>> {
        &self.shared.manager
    }

    /// Returns the topic set.
    #[must_use]
    pub fn topics(&self) -> &Topics {
        &self.shared.topics
    }

    /// Returns `true` between a successful start and stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Returns `true` while the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Publishes the current state of every assigned side.
    ///
    /// # Errors
    ///
    /// Returns error if the bridge is not running, the state cannot be
    /// fetched, or a publish fails.
    pub async fn publish_state(&self) -> Result<()> {
        let running = self.running.as_ref().ok_or_else(|| {
            ProtocolError::ConnectionFailed("MQTT bridge is not running".to_string())
        })?;
        publish_state(&self.shared, &running.client).await
    }

    async fn connect(&self) -> Result<(AsyncClient, CancellationToken, JoinHandle<()>)> {
        let config = &self.shared.config;
        let (host, port) = config.broker_address()?;

        let mut options = MqttOptions::new(config.resolve_client_id(), &host, port);
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);
        if let Some((username, password)) = config.credentials() {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let close = CancellationToken::new();
        let (connack_tx, connack_rx) = oneshot::channel();

        let connection_task = tokio::spawn(handle_events(
            event_loop,
            Arc::clone(&self.shared),
            client.clone(),
            close.clone(),
            connack_tx,
        ));

        let timeout = config.connection_timeout();
        let failure = match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => None,
            Ok(Err(_)) => Some("MQTT event loop terminated unexpectedly".to_string()),
            Err(_) => Some(format!(
                "MQTT connection timeout after {}s",
                timeout.as_secs()
            )),
        };
        if let Some(message) = failure {
            close.cancel();
            connection_task.abort();
            return Err(ProtocolError::ConnectionFailed(message).into());
        }

        tracing::info!(host = %host, port = %port, "Connected to MQTT broker");
        Ok((client, close, connection_task))
    }
}

impl<B: BackendApi + 'static> Adapter for MqttBridge<B> {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn start(&mut self, shutdown: CancellationToken) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let (client, close, connection_task) = self.connect().await?;

        let startup = async {
            publish_discovery(&self.shared, &client).await?;
            publish_state(&self.shared, &client).await?;
            subscribe_commands(&self.shared, &client).await?;
            publish_availability(&self.shared, &client, ONLINE).await
        };
        if let Err(e) = startup.await {
            // Best effort: the error being returned matters more.
            let _ = client.try_disconnect();
            close.cancel();
            connection_task.abort();
            self.shared.connected.store(false, Ordering::Release);
            return Err(e);
        }

        let poll_stop = shutdown.child_token();
        let poll_task = tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            client.clone(),
            poll_stop.clone(),
        ));

        self.running = Some(Running {
            client,
            poll_stop,
            close,
            poll_task,
            connection_task,
        });
        tracing::info!(
            device_id = %self.shared.config.device_id(),
            "MQTT bridge started"
        );
        Ok(())
    }

    async fn handle_command(&self, command: Command) -> Result<()> {
        execute_command(&self.shared.manager, command).await
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        running.poll_stop.cancel();
        if let Err(e) = (&mut running.poll_task).await {
            tracing::warn!(error = %e, "MQTT poll loop ended abnormally");
        }

        if self.shared.connected.load(Ordering::Acquire) {
            if let Err(e) = publish_availability(&self.shared, &running.client, OFFLINE).await {
                tracing::warn!(error = %e, "Failed to publish offline availability");
            }
            for topic in self.shared.topics.command_topics() {
                if let Err(e) = running.client.unsubscribe(&topic).await {
                    tracing::warn!(topic = %topic, error = %e, "Failed to unsubscribe");
                }
            }
            if let Err(e) = running.client.disconnect().await {
                tracing::warn!(error = %e, "Failed to request MQTT disconnect");
            }
        }

        if tokio::time::timeout(DISCONNECT_LINGER, &mut running.connection_task)
            .await
            .is_err()
        {
            tracing::debug!("MQTT connection task did not finish in time, aborting");
            running.connection_task.abort();
        }
        running.close.cancel();
        self.shared.connected.store(false, Ordering::Release);

        tracing::info!(
            device_id = %self.shared.config.device_id(),
            "MQTT bridge stopped"
        );
        Ok(())
    }
}

impl<B> std::fmt::Debug for MqttBridge<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBridge")
            .field("config", &self.shared.config)
            .field("running", &self.running.is_some())
            .field("connected", &self.shared.connected.load(Ordering::Acquire))
            .finish()
    }
}

impl<B> Drop for MqttBridge<B> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.poll_stop.cancel();
            running.close.cancel();
            running.poll_task.abort();
            running.connection_task.abort();
        }
    }
}

/// Drives the MQTT event loop until the bridge closes.
async fn handle_events<B: BackendApi + 'static>(
    mut event_loop: EventLoop,
    shared: Arc<Shared<B>>,
    client: AsyncClient,
    close: CancellationToken,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Outgoing, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        let event = tokio::select! {
            () = close.cancelled() => break,
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                shared.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    // Initial connection: `start` runs the full sequence.
                    let _ = tx.send(());
                } else {
                    tracing::info!("Reconnected to MQTT broker");
                    tokio::spawn(on_reconnect(Arc::clone(&shared), client.clone()));
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                tracing::debug!(
                    topic = %publish.topic,
                    payload = %payload,
                    "MQTT message received"
                );
                tokio::spawn(handle_message(
                    Arc::clone(&shared),
                    client.clone(),
                    publish.topic,
                    payload,
                ));
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                shared.connected.store(false, Ordering::Release);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect sent");
                shared.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                shared.connected.store(false, Ordering::Release);
                let retry = shared.config.reconnect_interval();
                tracing::warn!(
                    error = %e,
                    retry_in_ms = u64::try_from(retry.as_millis()).unwrap_or(u64::MAX),
                    "MQTT connection error, retrying"
                );
                tokio::select! {
                    () = close.cancelled() => break,
                    () = tokio::time::sleep(retry) => {}
                }
            }
        }
    }
}

/// Restores retained state and subscriptions after a reconnection.
async fn on_reconnect<B: BackendApi>(shared: Arc<Shared<B>>, client: AsyncClient) {
    if let Err(e) = publish_discovery(&shared, &client).await {
        tracing::error!(error = %e, "Failed to republish discovery configs");
    }
    if let Err(e) = subscribe_commands(&shared, &client).await {
        tracing::error!(error = %e, "Failed to resubscribe to command topics");
    }
    if let Err(e) = publish_availability(&shared, &client, ONLINE).await {
        tracing::error!(error = %e, "Failed to publish availability");
    }
}

/// Turns a command message into a [`Command`].
///
/// Returns `None` for payloads that are malformed or ask for an unknown mode.
fn parse_command(side: Side, kind: CommandTopic, payload: &str) -> Option<Command> {
    match kind {
        CommandTopic::SetTemperature => payload
            .trim()
            .parse::<i32>()
            .ok()
            .map(|level| Command::set_temperature(side, level)),
        CommandTopic::SetMode => match ClimateMode::parse_payload(payload)? {
            ClimateMode::Off => Some(Command::off(side)),
            ClimateMode::Heat | ClimateMode::Cool => Some(Command::on(side)),
        },
    }
}

/// Executes one command message and republishes state.
async fn handle_message<B: BackendApi>(
    shared: Arc<Shared<B>>,
    client: AsyncClient,
    topic: String,
    payload: String,
) {
    let Some((side, kind)) = shared.topics.parse_command(&topic) else {
        return;
    };
    let Some(command) = parse_command(side, kind, &payload) else {
        tracing::debug!(topic = %topic, payload = %payload, "Ignoring malformed command");
        return;
    };

    let outcome = tokio::time::timeout(COMMAND_TIMEOUT, async {
        if let Err(e) = execute_command(&shared.manager, command).await {
            tracing::error!(
                action = %command.action,
                side = %side,
                error = %e,
                "Failed to handle MQTT command"
            );
            return;
        }
        if let Err(e) = publish_state(&shared, &client).await {
            tracing::error!(error = %e, "Failed to publish state after command");
        }
    })
    .await;

    if outcome.is_err() {
        tracing::error!(
            action = %command.action,
            side = %side,
            "MQTT command timed out"
        );
    }
}

/// Periodically refreshes and republishes state.
async fn poll_loop<B: BackendApi>(
    shared: Arc<Shared<B>>,
    client: AsyncClient,
    stop: CancellationToken,
) {
    let period = shared.config.poll_interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            _ = ticker.tick() => {
                shared.manager.invalidate_cache();
                match tokio::time::timeout(POLL_TIMEOUT, publish_state(&shared, &client)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "Failed to publish state during poll");
                    }
                    Err(_) => tracing::error!("State poll timed out"),
                }
            }
        }
    }
    tracing::debug!("MQTT poll loop stopped");
}

async fn publish_retained(
    client: &AsyncClient,
    topic: String,
    payload: impl Into<Vec<u8>>,
) -> Result<()> {
    client
        .publish(topic, QoS::AtLeastOnce, true, payload)
        .await
        .map_err(ProtocolError::from)?;
    Ok(())
}

async fn publish_discovery<B>(shared: &Shared<B>, client: &AsyncClient) -> Result<()> {
    let config = &shared.config;
    for (side, discovery) in
        discovery_configs(&shared.topics, config.device_id(), config.device_name())
    {
        let payload = serde_json::to_vec(&discovery).map_err(ProtocolError::from)?;
        publish_retained(client, shared.topics.discovery(side), payload).await?;
    }
    tracing::debug!(device_id = %config.device_id(), "Published discovery configs");
    Ok(())
}

async fn publish_state<B: BackendApi>(shared: &Shared<B>, client: &AsyncClient) -> Result<()> {
    let state = shared.manager.get_state().await?;
    let topics = &shared.topics;

    for side in Side::ALL {
        let Some(user) = state.user(side) else {
            continue;
        };
        let mode = climate_mode(user.state(), user.target_level());

        publish_retained(client, topics.temperature(side), user.target_level().to_string())
            .await?;
        publish_retained(client, topics.mode(side), mode.as_str()).await?;
        publish_retained(
            client,
            topics.current_temperature(side),
            format!("{:.1}", user.bed_temperature()),
        )
        .await?;
    }
    Ok(())
}

async fn subscribe_commands<B>(shared: &Shared<B>, client: &AsyncClient) -> Result<()> {
    for topic in shared.topics.command_topics() {
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(ProtocolError::from)?;
    }
    Ok(())
}

async fn publish_availability<B>(
    shared: &Shared<B>,
    client: &AsyncClient,
    status: &'static str,
) -> Result<()> {
    publish_retained(client, shared.topics.availability(), status).await
}
