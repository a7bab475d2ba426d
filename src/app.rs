use axum::routing::get;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::routes::{auth, health, portfolio, stocks};
use crate::state::AppState;

pub fn create_app(state: AppState, cors: &CorsConfig) -> Router {
    Router::<AppState>::new()
        .route("/", get(root))
        .nest("/health", health::router())
        .nest("/api/auth", auth::router())
        .nest("/api/stock", stocks::router())
        .nest("/api/portfolio", portfolio::router())
        .layer(cors_layer(cors.clone()))
        .with_state(state)
}

fn cors_layer(cors: CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().map(|o| cors.allows(o)).unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> &'static str {
    "StockCrypt backend running"
}
