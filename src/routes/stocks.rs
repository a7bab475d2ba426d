use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::{
    AddWatchlistRequest, AnalyzeRequest, CompareRequest, RemovedFromWatchlist, StockAnalysis,
    StockComparison, TrendingStock, WatchlistStock,
};
use crate::services::{analysis_service, watchlist_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Public analysis
        .route("/analyze", post(analyze))
        .route("/compare", post(compare))
        .route("/trending", get(trending))
        // Watchlist
        .route("/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route("/watchlist/:symbol", delete(remove_from_watchlist))
        .route("/watchlist/:symbol/refresh", put(refresh_watchlist_entry))
}

pub async fn analyze(
    State(state): State<AppState>,
    AppJson(request): AppJson<AnalyzeRequest>,
) -> Result<Json<StockAnalysis>, AppError> {
    let symbol = request.symbol.unwrap_or_default();
    info!("POST /api/stock/analyze - Analyzing {}", symbol);

    let analysis = analysis_service::analyze(&state.quotes, &symbol)
        .await
        .map_err(|e| {
            error!("Analysis of {} failed: {}", symbol, e);
            e
        })?;

    Ok(Json(analysis))
}

pub async fn compare(
    State(state): State<AppState>,
    AppJson(request): AppJson<CompareRequest>,
) -> Result<Json<StockComparison>, AppError> {
    let (Some(symbol1), Some(symbol2)) = (request.symbol1, request.symbol2) else {
        return Err(AppError::Validation("Both stock symbols are required".into()));
    };
    info!("POST /api/stock/compare - Comparing {} and {}", symbol1, symbol2);

    let comparison = analysis_service::compare(&state.quotes, &symbol1, &symbol2)
        .await
        .map_err(|e| {
            error!("Comparison of {} and {} failed: {}", symbol1, symbol2, e);
            e
        })?;

    Ok(Json(comparison))
}

pub async fn trending(State(state): State<AppState>) -> Json<Vec<TrendingStock>> {
    info!("GET /api/stock/trending - Building trending list");
    Json(analysis_service::trending(&state.quotes).await)
}

pub async fn list_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<WatchlistStock>>, AppError> {
    info!("GET /api/stock/watchlist - Listing watchlist for {}", user.user_id);

    let entries = watchlist_service::list(&state.pool, user.user_id).await.map_err(|e| {
        error!("Failed to fetch watchlist: {}", e);
        e
    })?;

    Ok(Json(entries))
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<AddWatchlistRequest>,
) -> Result<Json<WatchlistStock>, AppError> {
    info!("POST /api/stock/watchlist - Adding {:?} for {}", request.symbol, user.user_id);

    let entry = watchlist_service::add(&state.pool, &state.quotes, user.user_id, request)
        .await
        .map_err(|e| {
            error!("Failed to add to watchlist: {}", e);
            e
        })?;

    Ok(Json(entry))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(symbol): AppPath<String>,
) -> Result<Json<RemovedFromWatchlist>, AppError> {
    info!("DELETE /api/stock/watchlist/{} - Removing for {}", symbol, user.user_id);

    let removed = watchlist_service::remove(&state.pool, user.user_id, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to remove {} from watchlist: {}", symbol, e);
            e
        })?;

    Ok(Json(removed))
}

pub async fn refresh_watchlist_entry(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(symbol): AppPath<String>,
) -> Result<Json<WatchlistStock>, AppError> {
    info!("PUT /api/stock/watchlist/{}/refresh - Refreshing for {}", symbol, user.user_id);

    let entry = watchlist_service::refresh(&state.pool, &state.quotes, user.user_id, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to refresh watchlist entry {}: {}", symbol, e);
            e
        })?;

    Ok(Json(entry))
}
