use axum::routing::get;
use axum::Router;
use tracing::debug;

use crate::state::AppState;

/// Liveness only; the database and quote provider are not checked.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health() -> &'static str {
    debug!("GET /health");
    "OK"
}
