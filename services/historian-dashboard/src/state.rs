//! View state shared by the engine and the local server

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::{PushEvent, SensorInfo, SensorReading, Stats, StoredMessage};

/// Connection status of the push channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    pub fn from_connected(connected: bool) -> Self {
        if connected {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "status-connected",
            ConnectionStatus::Disconnected => "status-disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// One rendered message in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub topic: String,
    pub payload: serde_json::Value,
    pub timestamp: serde_json::Value,
    pub received_at_ms: u64,
    /// Zero for entries that were never highlighted
    pub highlighted_until_ms: u64,
    pub sensor_info: Option<SensorInfo>,
}

impl FeedEntry {
    pub fn is_highlighted(&self, now_ms: u64) -> bool {
        now_ms < self.highlighted_until_ms
    }
}

/// Everything the dashboard displays
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    /// Messages received in real time since startup
    pub message_count: u64,
    /// Newest first
    pub feed: VecDeque<FeedEntry>,
    pub feed_capacity: usize,
    pub highlight_ms: u64,
    pub stats: Option<Stats>,
    pub sensors: Vec<SensorReading>,
    pub socket: ConnectionStatus,
    pub last_error: Option<String>,
}

impl ViewState {
    pub fn new(feed_capacity: usize, highlight_ms: u64) -> Self {
        Self {
            message_count: 0,
            feed: VecDeque::new(),
            feed_capacity,
            highlight_ms,
            stats: None,
            sensors: Vec::new(),
            socket: ConnectionStatus::Disconnected,
            last_error: None,
        }
    }

    /// Replace the feed with a freshly loaded page of stored messages
    pub fn replace_messages(&mut self, messages: Vec<StoredMessage>, now_ms: u64) {
        self.feed.clear();
        for message in messages.into_iter().take(self.feed_capacity) {
            self.feed.push_back(FeedEntry {
                topic: message.topic,
                payload: message.payload,
                timestamp: message.timestamp,
                received_at_ms: now_ms,
                highlighted_until_ms: 0,
                sensor_info: None,
            });
        }
    }

    /// Insert a real-time message at the top, evicting the oldest beyond capacity
    pub fn push_message(&mut self, event: &PushEvent, now_ms: u64) {
        self.feed.push_front(FeedEntry {
            topic: event.topic.clone(),
            payload: event.payload.clone(),
            timestamp: event.timestamp.clone(),
            received_at_ms: now_ms,
            highlighted_until_ms: now_ms.saturating_add(self.highlight_ms),
            sensor_info: event.sensor_info().cloned(),
        });
        while self.feed.len() > self.feed_capacity {
            self.feed.pop_back();
        }
    }

    /// Bump the running count, returning the new value
    pub fn record_message(&mut self) -> u64 {
        self.message_count += 1;
        self.message_count
    }

    pub fn apply_stats(&mut self, stats: Stats) {
        self.stats = Some(stats);
    }

    pub fn replace_sensors(&mut self, sensors: Vec<SensorReading>) {
        self.sensors = sensors;
    }

    /// Update the push channel status, returning true if it changed
    pub fn set_socket_status(&mut self, status: ConnectionStatus) -> bool {
        let changed = self.socket != status;
        self.socket = status;
        changed
    }

    pub fn record_error(&mut self, error: String) {
        self.last_error = Some(error);
    }

    pub fn mqtt_status(&self) -> ConnectionStatus {
        ConnectionStatus::from_connected(self.stats.as_ref().is_some_and(|s| s.mqtt_connected))
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<ViewState>>;

pub fn new_state_handle(feed_capacity: usize, highlight_ms: u64) -> StateHandle {
    Arc::new(RwLock::new(ViewState::new(feed_capacity, highlight_ms)))
}
