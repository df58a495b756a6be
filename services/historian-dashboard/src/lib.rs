//! Historian Dashboard - live view of an MQTT data historian
//!
//! Polls the historian's REST API, listens on its push channel, and serves the
//! resulting message and sensor feeds as a local web page.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod render;
pub mod server;
pub mod socket;
pub mod state;

pub use config::{load_config, Config};
pub use error::{DashboardError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::BackendClient;
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::state::StateHandle;

/// Assembles a [`Dashboard`] from configuration and optional injected parts
pub struct DashboardBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
    push_channel: bool,
}

impl DashboardBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            cancel: None,
            push_channel: true,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Rely on the queued-message poll alone
    pub fn without_push_channel(mut self) -> Self {
        self.push_channel = false;
        self
    }

    pub async fn build(self) -> Result<Dashboard> {
        self.config.validate()?;

        let ws_url = if self.push_channel {
            Some(socket::ws_url(&self.config.backend.base_url)?)
        } else {
            None
        };

        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let backend = Arc::new(BackendClient::new(&self.config.backend.base_url, http));
        let state = state::new_state_handle(self.config.feed.capacity, self.config.feed.highlight_ms);
        let cancel = self.cancel.unwrap_or_default();
        let engine = Engine::new(backend, &self.config, Arc::clone(&state), cancel.clone());

        tracing::debug!(
            "Built dashboard for {} (push channel: {:?})",
            self.config.backend.base_url,
            ws_url
        );

        Ok(Dashboard {
            config: self.config,
            engine,
            state,
            cancel,
            ws_url,
        })
    }
}

/// A configured dashboard, ready to start
pub struct Dashboard {
    config: Config,
    engine: Engine,
    state: StateHandle,
    cancel: CancellationToken,
    ws_url: Option<String>,
}

impl Dashboard {
    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the cancellation token fires or Ctrl-C is received
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Shutdown signal received"),
                        Err(e) => {
                            tracing::warn!("Failed to listen for ctrl-c: {}", e);
                            return;
                        }
                    }
                    cancel_for_signal.cancel();
                }
                _ = cancel_for_signal.cancelled() => {}
            }
        });

        self.engine.initial_load().await;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let push_channel = self.ws_url.clone().map(|url| {
            let reconnect_delay = self.config.polling.reconnect_delay();
            let cancel = self.cancel.clone();
            tokio::spawn(socket::run_push_channel(
                url,
                reconnect_delay,
                events_tx,
                cancel,
            ))
        });

        let server = if self.config.server.enabled {
            Some(self.spawn_server())
        } else {
            None
        };

        tracing::info!("Historian dashboard started");

        self.engine.run(events_rx).await;

        if let Some(handle) = push_channel {
            let _ = handle.await;
        }
        if let Some(handle) = server {
            let _ = handle.await;
        }

        tracing::info!("Historian dashboard stopped");
        Ok(())
    }

    fn spawn_server(&self) -> tokio::task::JoinHandle<()> {
        let port = self.config.server.port;
        let router = server::build_router(
            Arc::clone(&self.state),
            self.config.server.refresh_interval_ms,
        );
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without local page.",
                        port,
                        e
                    );
                    return;
                }
            };
            tracing::info!("Dashboard listening on http://{}", addr);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard server stopped");
        })
    }
}
