//! Transactions and the holdings derived from them.
//!
//! Every holding mutation runs in one database transaction that locks the
//! holding row, so concurrent trades on the same (user, symbol) serialize.
//! Quotes are fetched before the lock is taken.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{holding_queries, transaction_queries};
use crate::errors::AppError;
use crate::models::{
    CreateTransactionRequest, Holding, HoldingDetail, MessageResponse, Pagination,
    PerformanceMetrics, PortfolioSummary, RealizedTrade, Transaction, TransactionFilter,
    TransactionPage, TransactionQuery, TransactionType, UpdateTransactionRequest,
};
use crate::services::quote_service::QuoteService;
use crate::services::symbols::normalize_symbol;

const MAX_NOTES_LEN: usize = 500;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const PERFORMERS_SHOWN: usize = 3;

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub symbol: String,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price_per_share: f64,
    pub transaction_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub fn validate_create(input: CreateTransactionRequest) -> Result<NewTransaction, AppError> {
    let missing = || AppError::Validation("Missing required fields".into());

    let symbol = input.symbol.filter(|s| !s.trim().is_empty()).ok_or_else(missing)?;
    let raw_type = input.transaction_type.ok_or_else(missing)?;
    let quantity = input.quantity.ok_or_else(missing)?;
    let price_per_share = input.price_per_share.ok_or_else(missing)?;

    let transaction_type = raw_type.parse::<TransactionType>().map_err(AppError::Validation)?;
    check_positive(Some(quantity), Some(price_per_share))?;
    check_notes(input.notes.as_deref())?;

    Ok(NewTransaction {
        symbol: normalize_symbol(&symbol)?,
        transaction_type,
        quantity,
        price_per_share,
        transaction_date: input.transaction_date,
        notes: input.notes,
    })
}

pub fn validate_update(input: &UpdateTransactionRequest) -> Result<(), AppError> {
    check_positive(input.quantity, input.price_per_share)?;
    check_notes(input.notes.as_deref())
}

fn check_positive(quantity: Option<f64>, price: Option<f64>) -> Result<(), AppError> {
    let positive = |v: Option<f64>| v.map_or(true, |v| v.is_finite() && v > 0.0);
    if positive(quantity) && positive(price) {
        Ok(())
    } else {
        Err(AppError::Validation("Quantity and price must be positive".into()))
    }
}

fn check_notes(notes: Option<&str>) -> Result<(), AppError> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(AppError::Validation(format!(
            "Notes cannot exceed {} characters",
            MAX_NOTES_LEN
        ))),
        _ => Ok(()),
    }
}

/// Turns listing query parameters into a filter, returning the page number alongside.
pub fn build_filter(query: TransactionQuery) -> Result<(i64, TransactionFilter), AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::Validation("startDate must not be after endDate".into()));
        }
    }

    let symbol = match query.symbol.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(normalize_symbol(s)?),
        _ => None,
    };

    Ok((
        page,
        TransactionFilter {
            symbol,
            transaction_type: query.transaction_type,
            start_date: query.start_date,
            end_date: query.end_date,
            sort_by: query.sort_by.unwrap_or_default(),
            sort_order: query.sort_order.unwrap_or_default(),
            limit,
            offset: (page - 1) * limit,
        },
    ))
}

fn revalue(holding: &mut Holding, quoted: Option<f64>) {
    let price = quoted.unwrap_or_else(|| holding.fallback_price());
    holding.calculate_metrics(price);
}

pub async fn create_transaction(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    input: CreateTransactionRequest,
) -> Result<Transaction, AppError> {
    let new = validate_create(input)?;
    let quoted = quotes.current_price(&new.symbol).await;

    let transaction = Transaction::new(
        user_id,
        new.symbol,
        new.transaction_type,
        new.quantity,
        new.price_per_share,
        new.transaction_date,
        new.notes,
    );

    let mut db_tx = pool.begin().await?;
    let saved = transaction_queries::insert(&mut db_tx, &transaction).await?;

    let mut holding = holding_queries::lock_or_create(&mut db_tx, user_id, &saved.symbol).await?;
    holding.apply_trade(saved.transaction_type, saved.quantity, saved.price_per_share);
    revalue(&mut holding, quoted);
    holding_queries::save(&mut *db_tx, &holding).await?;

    db_tx.commit().await?;

    info!(
        "Recorded {} {} x {} @ {} for user {}",
        saved.transaction_type, saved.symbol, saved.quantity, saved.price_per_share, user_id
    );
    Ok(saved)
}

/// Reverses the stored trade, then applies the edited one.
pub async fn update_transaction(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    id: Uuid,
    input: UpdateTransactionRequest,
) -> Result<Transaction, AppError> {
    validate_update(&input)?;

    let existing = transaction_queries::fetch_one(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;
    let quoted = quotes.current_price(&existing.symbol).await;

    let mut db_tx = pool.begin().await?;
    let mut transaction = transaction_queries::fetch_for_update(&mut db_tx, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    let mut holding = holding_queries::lock_or_create(&mut db_tx, user_id, &transaction.symbol).await?;
    holding.reverse_trade(&transaction);

    transaction.apply_edit(&input);
    holding.apply_trade(transaction.transaction_type, transaction.quantity, transaction.price_per_share);
    revalue(&mut holding, quoted);

    let saved = transaction_queries::update(&mut db_tx, &transaction).await?;
    holding_queries::save(&mut *db_tx, &holding).await?;
    db_tx.commit().await?;

    info!("Updated transaction {} for user {}", id, user_id);
    Ok(saved)
}

pub async fn delete_transaction(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    id: Uuid,
) -> Result<MessageResponse, AppError> {
    let existing = transaction_queries::fetch_one(pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;
    let quoted = quotes.current_price(&existing.symbol).await;

    let mut db_tx = pool.begin().await?;
    let transaction = transaction_queries::fetch_for_update(&mut db_tx, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    transaction_queries::delete(&mut db_tx, user_id, id).await?;

    let mut holding = holding_queries::lock_or_create(&mut db_tx, user_id, &transaction.symbol).await?;
    holding.reverse_trade(&transaction);
    revalue(&mut holding, quoted);
    holding_queries::save(&mut *db_tx, &holding).await?;

    db_tx.commit().await?;

    info!("Deleted transaction {} for user {}", id, user_id);
    Ok(MessageResponse {
        message: "Transaction deleted successfully".to_string(),
    })
}

pub async fn list_transactions(
    pool: &PgPool,
    user_id: Uuid,
    query: TransactionQuery,
) -> Result<TransactionPage, AppError> {
    let (page, filter) = build_filter(query)?;

    let (transactions, total) = futures::try_join!(
        transaction_queries::list(pool, user_id, &filter),
        transaction_queries::count(pool, user_id, &filter),
    )?;

    Ok(TransactionPage {
        transactions,
        pagination: Pagination::new(page, filter.limit, total),
    })
}

/// Re-prices a holding under its row lock. `None` when the holding is gone.
async fn store_valuation(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
    price: f64,
) -> Result<Option<Holding>, AppError> {
    let mut db_tx = pool.begin().await?;
    let Some(mut holding) = holding_queries::lock(&mut db_tx, user_id, symbol).await? else {
        return Ok(None);
    };

    holding.calculate_metrics(price);
    let saved = holding_queries::save(&mut *db_tx, &holding).await?;
    db_tx.commit().await?;
    Ok(Some(saved))
}

/// Open holdings re-priced from fresh quotes. A holding whose quote or save
/// fails is returned with its previous snapshot.
pub async fn list_holdings(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
) -> Result<Vec<Holding>, AppError> {
    let holdings = holding_queries::fetch_open(pool, user_id).await?;

    let refreshed = join_all(holdings.into_iter().map(|holding| async move {
        let price = match quotes.quote(&holding.symbol).await {
            Ok(quote) => quote.close,
            Err(e) => {
                warn!("Error updating {}: {}", holding.symbol, e);
                return holding;
            }
        };

        match store_valuation(pool, user_id, &holding.symbol, price).await {
            Ok(Some(saved)) => saved,
            Ok(None) => holding,
            Err(e) => {
                warn!("Error saving valuation for {}: {}", holding.symbol, e);
                holding
            }
        }
    }))
    .await;

    Ok(refreshed)
}

pub async fn holding_detail(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<HoldingDetail, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let holding = holding_queries::fetch_one(pool, user_id, &symbol)
        .await?
        .ok_or_else(|| AppError::NotFound("Holding not found".into()))?;
    let transactions = transaction_queries::fetch_by_symbol(pool, user_id, &symbol).await?;

    Ok(HoldingDetail { holding, transactions })
}

pub async fn refresh_holding(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
    symbol: &str,
) -> Result<Holding, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let not_found = || AppError::NotFound("Holding not found".into());

    holding_queries::fetch_one(pool, user_id, &symbol)
        .await?
        .ok_or_else(not_found)?;

    let quote = quotes.quote(&symbol).await?;
    store_valuation(pool, user_id, &symbol, quote.close)
        .await?
        .ok_or_else(not_found)
}

/// Removes the holding and every transaction recorded for the symbol.
pub async fn delete_holding(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<MessageResponse, AppError> {
    let symbol = normalize_symbol(symbol)?;

    let mut db_tx = pool.begin().await?;
    let removed = transaction_queries::delete_by_symbol(&mut db_tx, user_id, &symbol).await?;
    holding_queries::delete(&mut db_tx, user_id, &symbol).await?;
    db_tx.commit().await?;

    info!("Deleted holding {} and {} transactions for user {}", symbol, removed, user_id);
    Ok(MessageResponse {
        message: format!("All holdings and transactions for {} deleted successfully", symbol),
    })
}

pub async fn summary(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
) -> Result<PortfolioSummary, AppError> {
    let holdings = list_holdings(pool, quotes, user_id).await?;
    Ok(summarize(holdings))
}

pub async fn performance(
    pool: &PgPool,
    quotes: &QuoteService,
    user_id: Uuid,
) -> Result<PerformanceMetrics, AppError> {
    let holdings = list_holdings(pool, quotes, user_id).await?;
    let history = transaction_queries::fetch_history(pool, user_id).await?;
    Ok(performance_metrics(&holdings, &history))
}

pub fn summarize(holdings: Vec<Holding>) -> PortfolioSummary {
    let total_value: f64 = holdings.iter().map(|h| h.current_value).sum();
    let total_invested: f64 = holdings.iter().map(|h| h.total_invested).sum();
    let total_profit_loss: f64 = holdings.iter().map(|h| h.profit_loss).sum();

    let mut ranked = holdings;
    ranked.sort_by(|a, b| b.profit_loss_percent.total_cmp(&a.profit_loss_percent));

    let top_performers = ranked.iter().take(PERFORMERS_SHOWN).cloned().collect();
    let worst_performers = ranked.iter().rev().take(PERFORMERS_SHOWN).cloned().collect();

    PortfolioSummary {
        total_value,
        total_invested,
        total_profit_loss,
        total_profit_loss_percent: if total_invested > 0.0 {
            total_profit_loss / total_invested * 100.0
        } else {
            0.0
        },
        holdings_count: ranked.len(),
        top_performers,
        worst_performers,
    }
}

/// Approximate realized gain per SELL: the sale price against the simple
/// mean of earlier BUY prices for the same symbol. Sells with no earlier
/// BUY are skipped.
pub fn realized_trades(history: &[Transaction]) -> Vec<RealizedTrade> {
    history
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Sell)
        .filter_map(|sell| {
            let prior_prices: Vec<f64> = history
                .iter()
                .filter(|t| {
                    t.transaction_type == TransactionType::Buy
                        && t.symbol == sell.symbol
                        && t.transaction_date < sell.transaction_date
                })
                .map(|t| t.price_per_share)
                .collect();

            if prior_prices.is_empty() {
                return None;
            }
            let average = prior_prices.iter().sum::<f64>() / prior_prices.len() as f64;

            Some(RealizedTrade {
                transaction_id: sell.id,
                symbol: sell.symbol.clone(),
                quantity: sell.quantity,
                sell_price: sell.price_per_share,
                average_buy_price: average,
                realized_gain: (sell.price_per_share - average) * sell.quantity,
                transaction_date: sell.transaction_date,
            })
        })
        .collect()
}

pub fn performance_metrics(holdings: &[Holding], history: &[Transaction]) -> PerformanceMetrics {
    let trades = realized_trades(history);
    let realized_gains: f64 = trades.iter().map(|t| t.realized_gain).sum();
    let unrealized_gains: f64 = holdings.iter().map(|h| h.profit_loss).sum();
    let total_invested: f64 = holdings.iter().map(|h| h.total_invested).sum();
    let total_return = realized_gains + unrealized_gains;

    let by_gain = |a: &&RealizedTrade, b: &&RealizedTrade| -> Ordering {
        a.realized_gain.total_cmp(&b.realized_gain)
    };

    PerformanceMetrics {
        total_return,
        total_return_percent: if total_invested > 0.0 {
            total_return / total_invested * 100.0
        } else {
            0.0
        },
        realized_gains,
        unrealized_gains,
        total_dividends: 0.0,
        best_trade: trades.iter().max_by(by_gain).cloned(),
        worst_trade: trades.iter().min_by(by_gain).cloned(),
    }
}
