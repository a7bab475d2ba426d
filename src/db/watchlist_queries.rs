use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{StoredAnalysis, WatchlistStock};

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WatchlistStock>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistStock>(
        r#"
        SELECT * FROM watchlist_stocks
        WHERE user_id = $1
        ORDER BY added_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Adding an already-tracked symbol replaces its analysis and notes.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
    analysis: &StoredAnalysis,
    notes: &str,
) -> Result<WatchlistStock, sqlx::Error> {
    sqlx::query_as::<_, WatchlistStock>(
        r#"
        INSERT INTO watchlist_stocks (id, user_id, symbol, last_analysis, notes, added_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        ON CONFLICT (user_id, symbol) DO UPDATE
        SET last_analysis = EXCLUDED.last_analysis,
            notes = EXCLUDED.notes,
            added_at = NOW(),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(symbol)
    .bind(Json(analysis.clone()))
    .bind(notes)
    .fetch_one(pool)
    .await
}

pub async fn update_analysis(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
    analysis: &StoredAnalysis,
) -> Result<Option<WatchlistStock>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistStock>(
        r#"
        UPDATE watchlist_stocks
        SET last_analysis = $3, updated_at = NOW()
        WHERE user_id = $1 AND symbol = $2
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(Json(analysis.clone()))
    .fetch_optional(pool)
    .await
}

pub async fn delete(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<WatchlistStock>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistStock>(
        "DELETE FROM watchlist_stocks WHERE user_id = $1 AND symbol = $2 RETURNING *",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(pool)
    .await
}
