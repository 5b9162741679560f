// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::models::MonitorInfo;
use crate::monitor::Emitter;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) emitter: Arc<Emitter>,
    pub(crate) info: Arc<MonitorInfo>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    emitter: Arc<Emitter>,
    info: Arc<MonitorInfo>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        emitter,
        info,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "traffic-stats: interface byte counters over WebSockets" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/info", get(http::api_info_handler)) // GET /api/info
        .route("/ws/speed", get(ws::ws_speed)) // WS /ws/speed
        .route("/ws/stats", get(ws::ws_stats)) // WS /ws/stats
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
