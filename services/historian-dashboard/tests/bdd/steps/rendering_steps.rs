//! BDD step definitions for the rendering feature

use cucumber::{given, then, when};

use historian_dashboard::api::SensorReading;
use historian_dashboard::render::{render_page, render_status_label};
use historian_dashboard::state::ConnectionStatus;

use crate::world::DashboardWorld;

fn parse_status(s: &str) -> ConnectionStatus {
    match s {
        "Connected" => ConnectionStatus::Connected,
        "Disconnected" => ConnectionStatus::Disconnected,
        other => panic!("Unknown status: {}", other),
    }
}

#[given("the push channel is connected")]
fn push_channel_connected(world: &mut DashboardWorld) {
    world
        .view_mut()
        .set_socket_status(ConnectionStatus::Connected);
}

#[given(expr = "a sensor {string} reading {int} with no location")]
fn sensor_without_location(world: &mut DashboardWorld, sensor_type: String, value: i64) {
    world.view_mut().replace_sensors(vec![SensorReading {
        sensor_type,
        value: serde_json::json!(value),
        unit: Some("hPa".to_string()),
        ..SensorReading::default()
    }]);
}

#[when("the page is rendered")]
fn page_rendered(world: &mut DashboardWorld) {
    let view = world.view.as_ref().expect("feed not set up");
    world.rendered = Some(render_page(view, 0, 1000));
}

#[then(expr = "the rendered page should contain {string}")]
fn page_contains(world: &mut DashboardWorld, expected: String) {
    let html = world.rendered.as_ref().expect("page not rendered");
    assert!(html.contains(&expected), "missing {:?} in page", expected);
}

#[then(expr = "the rendered page should not contain {string}")]
fn page_does_not_contain(world: &mut DashboardWorld, unexpected: String) {
    let html = world.rendered.as_ref().expect("page not rendered");
    assert!(!html.contains(&unexpected), "found {:?} in page", unexpected);
}

#[then(expr = "the {string} label should read {string} with class {string}")]
fn label_reads(world: &mut DashboardWorld, id: String, label: String, class: String) {
    let html = world.rendered.as_ref().expect("page not rendered");
    let status = parse_status(&label);
    assert_eq!(status.css_class(), class);
    let expected = render_status_label(&id, status);
    assert!(html.contains(&expected), "missing {:?} in page", expected);
}
