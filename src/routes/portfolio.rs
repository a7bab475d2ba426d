use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{
    CreateTransactionRequest, Holding, HoldingDetail, MessageResponse, PerformanceMetrics,
    PortfolioSummary, Transaction, TransactionPage, TransactionQuery, UpdateTransactionRequest,
};
use crate::services::portfolio_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Transactions
        .route("/transaction", post(create_transaction))
        .route("/transaction/:id", put(update_transaction).delete(delete_transaction))
        .route("/transactions", get(list_transactions))
        // Holdings
        .route("/holdings", get(list_holdings))
        .route(
            "/holdings/:symbol",
            get(get_holding).put(refresh_holding).delete(delete_holding),
        )
        // Aggregates
        .route("/summary", get(get_summary))
        .route("/performance", get(get_performance))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    info!("POST /api/portfolio/transaction - Recording trade for {}", user.user_id);

    let transaction =
        portfolio_service::create_transaction(&state.pool, &state.quotes, user.user_id, request)
            .await
            .map_err(|e| {
                error!("Failed to create transaction: {}", e);
                e
            })?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<TransactionQuery>,
) -> Result<Json<TransactionPage>, AppError> {
    info!("GET /api/portfolio/transactions - Listing for {}", user.user_id);

    let page = portfolio_service::list_transactions(&state.pool, user.user_id, query)
        .await
        .map_err(|e| {
            error!("Failed to list transactions: {}", e);
            e
        })?;

    Ok(Json(page))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    info!("PUT /api/portfolio/transaction/{} - Editing", id);

    let transaction =
        portfolio_service::update_transaction(&state.pool, &state.quotes, user.user_id, id, request)
            .await
            .map_err(|e| {
                error!("Failed to update transaction {}: {}", id, e);
                e
            })?;

    Ok(Json(transaction))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("DELETE /api/portfolio/transaction/{} - Deleting", id);

    let response = portfolio_service::delete_transaction(&state.pool, &state.quotes, user.user_id, id)
        .await
        .map_err(|e| {
            error!("Failed to delete transaction {}: {}", id, e);
            e
        })?;

    Ok(Json(response))
}

pub async fn list_holdings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Holding>>, AppError> {
    info!("GET /api/portfolio/holdings - Refreshing holdings for {}", user.user_id);

    let holdings = portfolio_service::list_holdings(&state.pool, &state.quotes, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch holdings: {}", e);
            e
        })?;

    Ok(Json(holdings))
}

pub async fn get_holding(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(symbol): AppPath<String>,
) -> Result<Json<HoldingDetail>, AppError> {
    info!("GET /api/portfolio/holdings/{} - Loading detail", symbol);

    let detail = portfolio_service::holding_detail(&state.pool, user.user_id, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to fetch holding {}: {}", symbol, e);
            e
        })?;

    Ok(Json(detail))
}

pub async fn refresh_holding(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(symbol): AppPath<String>,
) -> Result<Json<Holding>, AppError> {
    info!("PUT /api/portfolio/holdings/{} - Refreshing price", symbol);

    let holding = portfolio_service::refresh_holding(&state.pool, &state.quotes, user.user_id, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to refresh holding {}: {}", symbol, e);
            e
        })?;

    Ok(Json(holding))
}

pub async fn delete_holding(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(symbol): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("DELETE /api/portfolio/holdings/{} - Deleting holding", symbol);

    let response = portfolio_service::delete_holding(&state.pool, user.user_id, &symbol)
        .await
        .map_err(|e| {
            error!("Failed to delete holding {}: {}", symbol, e);
            e
        })?;

    Ok(Json(response))
}

pub async fn get_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PortfolioSummary>, AppError> {
    info!("GET /api/portfolio/summary - Summarizing for {}", user.user_id);

    let summary = portfolio_service::summary(&state.pool, &state.quotes, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to build summary: {}", e);
            e
        })?;

    Ok(Json(summary))
}

pub async fn get_performance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PerformanceMetrics>, AppError> {
    info!("GET /api/portfolio/performance - Computing for {}", user.user_id);

    let metrics = portfolio_service::performance(&state.pool, &state.quotes, user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to compute performance: {}", e);
            e
        })?;

    Ok(Json(metrics))
}
