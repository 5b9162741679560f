// GET handlers: version, api/info

use axum::{extract::State, response::IntoResponse};

use super::AppState;

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/info — static monitor identity (uid, cadences); fetch once, not streamed.
pub(super) async fn api_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.info.as_ref().clone())
}
