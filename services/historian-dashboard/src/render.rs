//! HTML rendering of the view state

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::api::{SensorInfo, SensorReading};
use crate::state::{ConnectionStatus, FeedEntry, ViewState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Escape the five HTML-significant characters
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Text form of a JSON scalar: strings verbatim, null empty, anything else as JSON
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Format a count with thousands separators
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a backend timestamp in local time
pub fn format_timestamp(value: &serde_json::Value) -> String {
    format_timestamp_in(value, &Local)
}

/// Format a backend timestamp in the given zone.
///
/// Strings may be RFC 3339 or naive ISO-8601 / SQL datetimes; numbers are epoch
/// milliseconds. Naive values are shown unconverted. Anything else is returned
/// as its display text.
pub fn format_timestamp_in<Tz>(value: &serde_json::Value, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return dt.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string();
            }
            for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                    return naive.format(TIMESTAMP_FORMAT).to_string();
                }
            }
            s.clone()
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| n.to_string()),
        other => display_value(other),
    }
}

pub fn render_status_label(id: &str, status: ConnectionStatus) -> String {
    format!(
        r#"<span id="{}" class="{}">{}</span>"#,
        id,
        status.css_class(),
        status
    )
}

fn render_sensor_details(info: &SensorInfo) -> String {
    if info.detected_sensors.is_empty() && info.numeric_values.is_empty() {
        return String::new();
    }
    let sensors = info
        .detected_sensors
        .iter()
        .map(|s| escape_html(s))
        .collect::<Vec<_>>()
        .join(", ");
    let values = info
        .numeric_values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
            <div class="sensor-info">{}{}</div>"#,
        if sensors.is_empty() {
            String::new()
        } else {
            format!("Sensors: {}", sensors)
        },
        if values.is_empty() {
            String::new()
        } else if sensors.is_empty() {
            format!("Values: {}", values)
        } else {
            format!(" | Values: {}", values)
        }
    )
}

pub fn render_feed_entry(entry: &FeedEntry, now_ms: u64) -> String {
    let class = if entry.is_highlighted(now_ms) {
        "message-item new-message"
    } else {
        "message-item"
    };
    let details = entry
        .sensor_info
        .as_ref()
        .map(render_sensor_details)
        .unwrap_or_default();
    format!(
        r#"<div class="{}">
            <div class="topic">{}</div>
            <div class="payload">{}</div>
            <div class="timestamp">{}</div>{}
        </div>"#,
        class,
        escape_html(&entry.topic),
        escape_html(&display_value(&entry.payload)),
        escape_html(&format_timestamp(&entry.timestamp)),
        details
    )
}

pub fn render_feed(state: &ViewState, now_ms: u64) -> String {
    state
        .feed
        .iter()
        .map(|entry| render_feed_entry(entry, now_ms))
        .collect()
}

pub fn render_sensor_card(sensor: &SensorReading) -> String {
    format!(
        r#"<div class="sensor-card">
            <h3>{}</h3>
            <div class="sensor-value">{}</div>
            <div class="sensor-unit">{}</div>
            <div class="sensor-location">Location: {}</div>
            <div class="timestamp">{}</div>
        </div>"#,
        escape_html(&sensor.sensor_type),
        escape_html(&display_value(&sensor.value)),
        escape_html(sensor.unit.as_deref().unwrap_or("")),
        escape_html(
            sensor
                .location
                .as_deref()
                .filter(|l| !l.is_empty())
                .unwrap_or("Unknown")
        ),
        escape_html(&format_timestamp(&sensor.timestamp)),
    )
}

pub fn render_sensors(state: &ViewState) -> String {
    state.sensors.iter().map(render_sensor_card).collect()
}

/// Render the full dashboard page
pub fn render_page(state: &ViewState, now_ms: u64, refresh_interval_ms: u64) -> String {
    let (total, topics) = match &state.stats {
        Some(stats) => (
            format_count(stats.total_messages),
            format_count(stats.unique_topics),
        ),
        None => ("-".to_string(), "-".to_string()),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>MQTT Historian Dashboard</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 1100px; margin: 0 auto; padding: 1rem; }}
        .stats {{ display: flex; gap: 1rem; }}
        .stat {{ flex: 1; padding: 0.75rem; border: 1px solid #dee2e6; border-radius: 0.25rem; }}
        .status-connected {{ color: #155724; background-color: #d4edda; padding: 0.1em 0.5em; border-radius: 0.25rem; }}
        .status-disconnected {{ color: #721c24; background-color: #f8d7da; padding: 0.1em 0.5em; border-radius: 0.25rem; }}
        .message-item {{ border-bottom: 1px solid #dee2e6; padding: 0.5rem; }}
        .new-message {{ background-color: #fff3cd; }}
        .topic {{ font-weight: 600; }}
        .payload {{ font-family: monospace; word-break: break-all; }}
        .timestamp, .sensor-info {{ color: #6c757d; font-size: 0.85em; }}
        #sensorsGrid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; }}
        .sensor-card {{ border: 1px solid #dee2e6; border-radius: 0.25rem; padding: 0.75rem; }}
        .sensor-value {{ font-size: 1.8em; font-weight: 600; }}
    </style>
    <script>
        setTimeout(function () {{ window.location.reload(); }}, {refresh});
    </script>
</head>
<body>
    <h1>MQTT Historian Dashboard</h1>
    <section class="stats">
        <div class="stat">Total Messages<br><strong id="totalMessages">{total}</strong></div>
        <div class="stat">Unique Topics<br><strong id="uniqueTopics">{topics}</strong></div>
        <div class="stat">Live Messages<br><strong id="liveMessages">{live}</strong></div>
        <div class="stat">MQTT<br>{mqtt}</div>
        <div class="stat">Push Channel<br>{socket}</div>
    </section>
    <section>
        <h2>Sensors</h2>
        <div id="sensorsGrid">{sensors}</div>
    </section>
    <section>
        <h2>Recent Messages</h2>
        <div id="messageList">{feed}</div>
    </section>
</body>
</html>"#,
        refresh = refresh_interval_ms,
        total = total,
        topics = topics,
        live = format_count(state.message_count),
        mqtt = render_status_label("mqttStatus", state.mqtt_status()),
        socket = render_status_label("websocketStatus", state.socket),
        sensors = render_sensors(state),
        feed = render_feed(state, now_ms),
    )
}
