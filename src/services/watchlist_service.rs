//! Per-user watchlist. Entries carry the analysis captured when they were
//! added or last refreshed; they are independent of holdings.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::watchlist_queries;
use crate::errors::AppError;
use crate::models::{AddWatchlistRequest, RemovedFromWatchlist, StoredAnalysis, WatchlistStock};
use crate::services::analysis_service;
use crate::services::quote_service::QuoteService;
use crate::services::symbols::normalize_symbol;

fn not_found() -> AppError {
    AppError::NotFound("Stock not found in watchlist".into())
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<WatchlistStock>, AppError> {
    Ok(watchlist_queries::fetch_for_user(pool, user_id).await?)
}

/// Analyzes the symbol and stores it, replacing any existing entry.
pub async fn add(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    request: AddWatchlistRequest,
) -> Result<WatchlistStock, AppError> {
    let symbol = normalize_symbol(request.symbol.as_deref().unwrap_or_default())?;
    let analysis = analysis_service::analyze(quotes, &symbol).await?;
    let notes = request.notes.unwrap_or_default();

    let entry = watchlist_queries::upsert(pool, user_id, &symbol, &StoredAnalysis::from(analysis), &notes).await?;
    info!("Added {} to watchlist for user {}", symbol, user_id);
    Ok(entry)
}

pub async fn remove(pool: &PgPool, user_id: Uuid, symbol: &str) -> Result<RemovedFromWatchlist, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let removed = watchlist_queries::delete(pool, user_id, &symbol)
        .await?
        .ok_or_else(not_found)?;

    Ok(RemovedFromWatchlist {
        message: "Stock removed from watchlist".to_string(),
        symbol: removed.symbol,
    })
}

/// Re-analyzes an existing entry. The quote is fetched first, so a missing
/// entry still costs one provider call.
pub async fn refresh(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    symbol: &str,
) -> Result<WatchlistStock, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let analysis = analysis_service::analyze(quotes, &symbol).await?;

    watchlist_queries::update_analysis(pool, user_id, &symbol, &StoredAnalysis::from(analysis))
        .await?
        .ok_or_else(not_found)
}
