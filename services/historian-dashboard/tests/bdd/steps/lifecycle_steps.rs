//! BDD step definitions for the dashboard lifecycle feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use historian_dashboard::io::HttpClient;
use historian_dashboard::{Config, DashboardBuilder};

use crate::world::{DashboardWorld, StalledHttpClient, StubHttpClient};

fn builder(world: &mut DashboardWorld) -> DashboardBuilder {
    let mut config = world.config.clone().expect("config not set");
    config.server.enabled = false;

    let http: Arc<dyn HttpClient> = if world.stalled_backend {
        Arc::new(StalledHttpClient)
    } else {
        let stub = Arc::new(StubHttpClient::reachable());
        world.backend = Some(stub.clone());
        stub as Arc<dyn HttpClient>
    };

    let mut builder = DashboardBuilder::new(config)
        .with_http_client(http)
        .without_push_channel();
    if let Some(cancel) = &world.cancel {
        builder = builder.with_cancellation_token(cancel.clone());
    }
    builder
}

#[given("a default dashboard config")]
fn default_config(world: &mut DashboardWorld) {
    world.config = Some(Config::default());
}

#[given(expr = "the backend URL is {string}")]
fn backend_url(world: &mut DashboardWorld, url: String) {
    world.config.as_mut().expect("config not set").backend.base_url = url;
}

#[given(expr = "the feed capacity is {int}")]
fn feed_capacity(world: &mut DashboardWorld, capacity: usize) {
    world.config.as_mut().expect("config not set").feed.capacity = capacity;
}

#[given("a backend that never answers")]
fn stalled_backend(world: &mut DashboardWorld) {
    world.stalled_backend = true;
}

#[given("a pre-cancelled cancellation token")]
fn pre_cancelled_token(world: &mut DashboardWorld) {
    let token = CancellationToken::new();
    token.cancel();
    world.cancel = Some(token);
}

#[when("the dashboard is built")]
async fn dashboard_built(world: &mut DashboardWorld) {
    let result = builder(world).build().await;
    world.build_result = Some(result.map(|_| ()));
}

#[when("the dashboard is built and started")]
async fn dashboard_built_and_started(world: &mut DashboardWorld) {
    let dashboard = builder(world)
        .build()
        .await
        .expect("dashboard should build");

    let result = tokio::time::timeout(Duration::from_secs(3), dashboard.start())
        .await
        .expect("dashboard did not stop");
    world.lifecycle_result = Some(result);
}

#[when("the dashboard is started and cancelled after the initial load")]
async fn dashboard_started_and_cancelled(world: &mut DashboardWorld) {
    let dashboard = builder(world)
        .build()
        .await
        .expect("dashboard should build");
    let cancel = dashboard.cancellation_token();
    let running = tokio::spawn(dashboard.start());

    let backend = world.backend().clone();
    tokio::time::timeout(Duration::from_secs(3), async {
        while backend.count("/api/sensors/latest").await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("initial load did not happen");
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(3), running)
        .await
        .expect("dashboard did not stop")
        .expect("dashboard task panicked");
    world.lifecycle_result = Some(result);
}

#[then("the build should succeed")]
fn build_succeeds(world: &mut DashboardWorld) {
    let result = world.build_result.as_ref().expect("build not attempted");
    assert!(result.is_ok(), "build failed: {:?}", result);
}

#[then("the build should fail")]
fn build_fails(world: &mut DashboardWorld) {
    let result = world.build_result.as_ref().expect("build not attempted");
    assert!(result.is_err());
}

#[then("the lifecycle should complete successfully")]
fn lifecycle_succeeds(world: &mut DashboardWorld) {
    let result = world.lifecycle_result.as_ref().expect("dashboard not started");
    assert!(result.is_ok(), "dashboard failed: {:?}", result);
}

#[then(expr = "the backend should have been asked for {string}")]
async fn backend_asked_for(world: &mut DashboardWorld, path: String) {
    assert!(world.backend().count(&path).await >= 1, "{} was not requested", path);
}
