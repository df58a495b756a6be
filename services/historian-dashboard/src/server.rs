//! Local web server exposing the rendered dashboard and a JSON snapshot

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

use crate::engine::current_epoch_ms;
use crate::render::render_page;
use crate::state::StateHandle;

/// Server application state
#[derive(Clone)]
pub struct ServerState {
    pub state: StateHandle,
    pub refresh_interval_ms: u64,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle, refresh_interval_ms: u64) -> Router {
    let server_state = ServerState {
        state,
        refresh_interval_ms,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/view", get(view_handler))
        .route("/health", get(health_handler))
        .with_state(server_state)
}

async fn index_handler(State(server): State<ServerState>) -> impl IntoResponse {
    let state = server.state.read().await;
    Html(render_page(
        &state,
        current_epoch_ms(),
        server.refresh_interval_ms,
    ))
}

async fn view_handler(State(server): State<ServerState>) -> impl IntoResponse {
    let state = server.state.read().await;
    axum::Json(state.clone())
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
