//! BDD step definitions for the message feed feature

use cucumber::{given, then, when};

use historian_dashboard::api::{PushEvent, StoredMessage};
use historian_dashboard::state::ViewState;

use crate::world::DashboardWorld;

const HIGHLIGHT_MS: u64 = 2000;

pub fn new_message(topic: &str, payload: &str) -> PushEvent {
    PushEvent {
        kind: "new_message".to_string(),
        topic: topic.to_string(),
        payload: serde_json::json!(payload),
        timestamp: serde_json::json!("2024-05-01T12:00:00"),
        ..PushEvent::default()
    }
}

#[given(expr = "an empty feed with capacity {int}")]
fn empty_feed(world: &mut DashboardWorld, capacity: usize) {
    world.view = Some(ViewState::new(capacity, HIGHLIGHT_MS));
}

#[when(expr = "a message on topic {string} arrives")]
fn message_arrives(world: &mut DashboardWorld, topic: String) {
    world.view_mut().push_message(&new_message(&topic, "x"), 0);
}

#[when(expr = "a message on topic {string} arrives at {int} ms")]
fn message_arrives_at(world: &mut DashboardWorld, topic: String, now_ms: u64) {
    world.view_mut().push_message(&new_message(&topic, "x"), now_ms);
}

#[when(expr = "a message on topic {string} with payload {string} arrives")]
fn message_with_payload_arrives(world: &mut DashboardWorld, topic: String, payload: String) {
    world.view_mut().push_message(&new_message(&topic, &payload), 0);
}

#[when(expr = "{int} messages arrive")]
fn many_messages_arrive(world: &mut DashboardWorld, count: usize) {
    let view = world.view_mut();
    for i in 1..=count {
        view.push_message(&new_message(&format!("topic/{}", i), "x"), 0);
    }
}

#[when(expr = "the stored messages {string} and {string} are loaded")]
fn stored_messages_loaded(world: &mut DashboardWorld, first: String, second: String) {
    let messages = [first, second]
        .into_iter()
        .map(|topic| StoredMessage {
            topic,
            payload: serde_json::json!("stored"),
            ..StoredMessage::default()
        })
        .collect();
    world.view_mut().replace_messages(messages, 0);
}

#[then(expr = "the feed should contain {int} entries")]
async fn feed_contains(world: &mut DashboardWorld, expected: usize) {
    let len = match (&world.view, &world.engine) {
        (Some(view), _) => view.feed.len(),
        (None, Some(engine)) => engine.state().read().await.feed.len(),
        (None, None) => panic!("no feed set up"),
    };
    assert_eq!(len, expected);
}

#[then(expr = "the first feed entry should have topic {string}")]
async fn first_entry_topic(world: &mut DashboardWorld, expected: String) {
    let topic = match (&world.view, &world.engine) {
        (Some(view), _) => view.feed.front().map(|e| e.topic.clone()),
        (None, Some(engine)) => engine
            .state()
            .read()
            .await
            .feed
            .front()
            .map(|e| e.topic.clone()),
        (None, None) => panic!("no feed set up"),
    };
    assert_eq!(topic.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the last feed entry should have topic {string}")]
fn last_entry_topic(world: &mut DashboardWorld, expected: String) {
    let view = world.view.as_ref().expect("feed not set up");
    assert_eq!(view.feed.back().map(|e| e.topic.as_str()), Some(expected.as_str()));
}

#[then(expr = "the first feed entry should be highlighted at {int} ms")]
fn first_entry_highlighted(world: &mut DashboardWorld, now_ms: u64) {
    let view = world.view.as_ref().expect("feed not set up");
    assert!(view.feed.front().expect("feed is empty").is_highlighted(now_ms));
}

#[then(expr = "the first feed entry should not be highlighted at {int} ms")]
fn first_entry_not_highlighted(world: &mut DashboardWorld, now_ms: u64) {
    let view = world.view.as_ref().expect("feed not set up");
    assert!(!view.feed.front().expect("feed is empty").is_highlighted(now_ms));
}
