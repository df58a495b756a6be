//! Push channel client
//!
//! Keeps a websocket open to the historian's `/ws` endpoint and forwards every
//! decoded frame to the engine. When the connection drops (or cannot be
//! established) it waits a fixed delay and tries again, forever, until the
//! cancellation token fires. There is no backoff and no retry cap.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use crate::api::PushEvent;

/// Events produced by the push channel task
#[derive(Debug, Clone, PartialEq)]
pub enum PushChannelEvent {
    Connected,
    Disconnected,
    Update(PushEvent),
}

/// Derive the websocket URL from the backend base URL
pub fn ws_url(base_url: &str) -> crate::Result<String> {
    let base_url = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        return Err(crate::DashboardError::Config(format!(
            "base_url must start with http:// or https://, got {:?}",
            base_url
        )));
    };
    Ok(format!("{}/ws", ws_base))
}

/// Run the push channel until cancelled.
///
/// Returns early if the receiving side of `events` is dropped.
pub async fn run_push_channel(
    url: String,
    reconnect_delay: Duration,
    events: mpsc::UnboundedSender<PushChannelEvent>,
    cancel: CancellationToken,
) {
    loop {
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Push channel cancelled while connecting");
                return;
            }
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((mut stream, _)) => {
                tracing::info!("Push channel connected to {}", url);
                if events.send(PushChannelEvent::Connected).is_err() {
                    return;
                }

                loop {
                    let frame = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            tracing::debug!("Push channel cancelled");
                            let _ = stream.close(None).await;
                            let _ = events.send(PushChannelEvent::Disconnected);
                            return;
                        }
                        frame = stream.next() => frame,
                    };

                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<PushEvent>(text.as_str()) {
                                Ok(event) => {
                                    if events.send(PushChannelEvent::Update(event)).is_err() {
                                        return;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Error parsing push channel message: {}", e);
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("Push channel error: {}", e);
                            break;
                        }
                    }
                }

                tracing::info!("Push channel disconnected");
            }
            Err(e) => {
                tracing::warn!("Push channel connection to {} failed: {}", url, e);
            }
        }

        if events.send(PushChannelEvent::Disconnected).is_err() {
            return;
        }

        tracing::debug!("Reconnecting push channel in {:?}", reconnect_delay);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Push channel cancelled while waiting to reconnect");
                return;
            }
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}
