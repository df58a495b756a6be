//! Engine: keeps the view state in sync with the historian backend

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{BackendClient, PushEvent};
use crate::config::Config;
use crate::socket::PushChannelEvent;
use crate::state::{ConnectionStatus, StateHandle};

/// Polls the backend on timers and applies real-time updates
#[derive(Debug, Clone)]
pub struct Engine {
    backend: Arc<BackendClient>,
    state: StateHandle,
    initial_message_limit: usize,
    queued_messages_interval: Duration,
    stats_interval: Duration,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        backend: Arc<BackendClient>,
        config: &Config,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            state,
            initial_message_limit: config.feed.initial_message_limit,
            queued_messages_interval: config.polling.queued_messages_interval(),
            stats_interval: config.polling.stats_interval(),
            cancel,
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Fetch stats, recent messages and sensors once. Gives up as soon as
    /// the cancellation token fires.
    pub async fn initial_load(&self) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Initial load cancelled");
            }
            _ = async {
                tokio::join!(self.load_stats(), self.load_messages(), self.load_sensors());
            } => {}
        }
    }

    pub async fn load_stats(&self) {
        match self.backend.fetch_stats().await {
            Ok(stats) => {
                tracing::debug!(
                    "Stats: {} messages, {} topics, mqtt_connected={}",
                    stats.total_messages,
                    stats.unique_topics,
                    stats.mqtt_connected
                );
                self.state.write().await.apply_stats(stats);
            }
            Err(e) => self.report_error("loading stats", e).await,
        }
    }

    pub async fn load_messages(&self) {
        match self.backend.fetch_messages(self.initial_message_limit).await {
            Ok(messages) => {
                tracing::debug!("Loaded {} recent messages", messages.len());
                self.state
                    .write()
                    .await
                    .replace_messages(messages, current_epoch_ms());
            }
            Err(e) => self.report_error("loading messages", e).await,
        }
    }

    pub async fn load_sensors(&self) {
        match self.backend.fetch_latest_sensors().await {
            Ok(sensors) => {
                tracing::debug!("Loaded {} sensor readings", sensors.len());
                self.state.write().await.replace_sensors(sensors);
            }
            Err(e) => self.report_error("loading sensors", e).await,
        }
    }

    pub async fn poll_queued_messages(&self) {
        match self.backend.fetch_queued_messages().await {
            Ok(events) => {
                if !events.is_empty() {
                    tracing::debug!("Received {} queued messages", events.len());
                }
                for event in &events {
                    self.handle_update(event).await;
                }
            }
            Err(e) => self.report_error("polling for messages", e).await,
        }
    }

    /// Apply one real-time update. Returns false if the event was ignored.
    pub async fn handle_update(&self, event: &PushEvent) -> bool {
        if !event.is_new_message() {
            tracing::trace!("Ignoring update of type {:?}", event.kind);
            return false;
        }

        let count = {
            let mut state = self.state.write().await;
            state.push_message(event, current_epoch_ms());
            state.record_message()
        };
        tracing::debug!("Message #{} on '{}'", count, event.topic);

        if event.is_sensor_data() {
            self.load_sensors().await;
        }
        true
    }

    pub async fn handle_push_channel_event(&self, event: PushChannelEvent) {
        match event {
            PushChannelEvent::Connected => {
                self.set_socket_status(ConnectionStatus::Connected).await;
            }
            PushChannelEvent::Disconnected => {
                self.set_socket_status(ConnectionStatus::Disconnected).await;
            }
            PushChannelEvent::Update(update) => {
                self.handle_update(&update).await;
            }
        }
    }

    async fn set_socket_status(&self, status: ConnectionStatus) {
        if self.state.write().await.set_socket_status(status) {
            tracing::info!("Push channel status: {}", status);
        }
    }

    async fn report_error(&self, action: &str, error: crate::DashboardError) {
        tracing::warn!("Error {}: {}", action, error);
        self.state
            .write()
            .await
            .record_error(format!("Error {}: {}", action, error));
    }

    /// Run the timers and the push-channel event loop until cancelled
    pub async fn run(&self, mut push_events: mpsc::UnboundedReceiver<PushChannelEvent>) {
        let queued = {
            let engine = self.clone();
            tokio::spawn(async move {
                tick_loop(
                    "queued messages",
                    engine.queued_messages_interval,
                    engine.cancel.clone(),
                    || engine.poll_queued_messages(),
                )
                .await;
            })
        };

        let stats = {
            let engine = self.clone();
            tokio::spawn(async move {
                tick_loop(
                    "stats",
                    engine.stats_interval,
                    engine.cancel.clone(),
                    || engine.load_stats(),
                )
                .await;
            })
        };

        let mut channel_open = true;
        while channel_open {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = push_events.recv() => match event {
                    Some(event) => {
                        tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => break,
                            _ = self.handle_push_channel_event(event) => {}
                        }
                    }
                    None => channel_open = false,
                },
            }
        }
        if !channel_open {
            tracing::debug!("Push channel closed, waiting for cancellation");
            self.cancel.cancelled().await;
        }

        let _ = queued.await;
        let _ = stats.await;
    }
}

/// Call `tick` every `interval` until cancelled. The first call happens after
/// one full interval.
async fn tick_loop<F, Fut>(name: &str, interval: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Timer for {} cancelled", name);
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Timer for {} cancelled during tick", name);
                break;
            }
            _ = tick() => {}
        }
    }
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
