//! Historian backend REST client and wire types

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::io::HttpClient;

/// Event type carried by push-channel frames that announce a stored message
pub const NEW_MESSAGE_TYPE: &str = "new_message";

/// Aggregate counters from `/api/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub unique_topics: u64,
    #[serde(default)]
    pub mqtt_connected: bool,
}

/// A message row from `/api/messages`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(default)]
    pub id: Option<i64>,
    pub topic: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

/// Latest reading of one sensor from `/api/sensors/latest`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

/// Sensor heuristics the backend attaches to parsed messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorInfo {
    #[serde(default)]
    pub detected_sensors: Vec<String>,
    #[serde(default)]
    pub numeric_values: Vec<f64>,
    #[serde(default)]
    pub is_sensor_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    #[serde(default)]
    pub sensor_info: Option<SensorInfo>,
}

/// A real-time update, delivered by the push channel or the queued-message poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub timestamp: serde_json::Value,
    #[serde(default)]
    pub parsed_data: Option<ParsedData>,
}

impl PushEvent {
    pub fn is_new_message(&self) -> bool {
        self.kind == NEW_MESSAGE_TYPE
    }

    pub fn sensor_info(&self) -> Option<&SensorInfo> {
        self.parsed_data.as_ref()?.sensor_info.as_ref()
    }

    /// True when the backend flagged the message as carrying sensor data
    pub fn is_sensor_data(&self) -> bool {
        self.sensor_info().is_some_and(|info| info.is_sensor_data)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Deserialize)]
struct SensorsResponse {
    #[serde(default)]
    sensors: Vec<SensorReading>,
}

#[derive(Debug, Deserialize)]
struct QueuedMessagesResponse {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

/// Client for the historian REST endpoints
pub struct BackendClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created BackendClient for {}", base_url);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).await?;
        if response.status != 200 {
            return Err(crate::DashboardError::Http(format!(
                "GET {} returned status {}",
                url, response.status
            )));
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    pub async fn fetch_stats(&self) -> crate::Result<Stats> {
        self.get_json("/api/stats").await
    }

    pub async fn fetch_messages(&self, limit: usize) -> crate::Result<Vec<StoredMessage>> {
        let response: MessagesResponse = self
            .get_json(&format!("/api/messages?limit={}", limit))
            .await?;
        Ok(response.messages)
    }

    pub async fn fetch_latest_sensors(&self) -> crate::Result<Vec<SensorReading>> {
        let response: SensorsResponse = self.get_json("/api/sensors/latest").await?;
        Ok(response.sensors)
    }

    /// Drain the messages the backend queued since the previous call
    pub async fn fetch_queued_messages(&self) -> crate::Result<Vec<PushEvent>> {
        let response: QueuedMessagesResponse = self.get_json("/api/queued-messages").await?;
        // Decoded one by one; the backend never resends a drained batch
        let events = response
            .messages
            .into_iter()
            .filter_map(|message| match serde_json::from_value::<PushEvent>(message) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!("Skipping malformed queued message: {}", e);
                    None
                }
            })
            .collect();
        Ok(events)
    }
}
