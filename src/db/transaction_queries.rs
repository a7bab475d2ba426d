use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Transaction, TransactionFilter};

pub async fn insert(conn: &mut PgConnection, tx: &Transaction) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions
            (id, user_id, symbol, type, quantity, price_per_share, total_amount,
             transaction_date, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(tx.user_id)
    .bind(&tx.symbol)
    .bind(tx.transaction_type)
    .bind(tx.quantity)
    .bind(tx.price_per_share)
    .bind(tx.total_amount)
    .bind(tx.transaction_date)
    .bind(&tx.notes)
    .bind(tx.created_at)
    .fetch_one(conn)
    .await
}

pub async fn fetch_one(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_for_update(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn update(conn: &mut PgConnection, tx: &Transaction) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET quantity = $1,
            price_per_share = $2,
            total_amount = $3,
            transaction_date = $4,
            notes = $5
        WHERE id = $6 AND user_id = $7
        RETURNING *
        "#,
    )
    .bind(tx.quantity)
    .bind(tx.price_per_share)
    .bind(tx.total_amount)
    .bind(tx.transaction_date)
    .bind(&tx.notes)
    .bind(tx.id)
    .bind(tx.user_id)
    .fetch_one(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_symbol(
    conn: &mut PgConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE user_id = $1 AND symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_by_symbol(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE user_id = $1 AND symbol = $2
        ORDER BY transaction_date DESC
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_all(pool)
    .await
}

/// Full history, oldest first.
pub async fn fetch_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 ORDER BY transaction_date ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &TransactionFilter) {
    query.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(symbol) = &filter.symbol {
        query.push(" AND symbol = ").push_bind(symbol.clone());
    }
    if let Some(transaction_type) = filter.transaction_type {
        query.push(" AND type = ").push_bind(transaction_type);
    }
    if let Some(start) = filter.start_date {
        query.push(" AND transaction_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        query.push(" AND transaction_date <= ").push_bind(end);
    }
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM transactions");
    push_filters(&mut query, user_id, filter);

    // Column and direction come from closed enums, never from raw input
    query.push(format!(
        " ORDER BY {} {}, id ASC",
        filter.sort_by.column(),
        filter.sort_order.keyword()
    ));
    query.push(" LIMIT ").push_bind(filter.limit);
    query.push(" OFFSET ").push_bind(filter.offset);

    query.build_query_as::<Transaction>().fetch_all(pool).await
}

pub async fn count(
    pool: &PgPool,
    user_id: Uuid,
    filter: &TransactionFilter,
) -> Result<i64, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM transactions");
    push_filters(&mut query, user_id, filter);

    query.build_query_scalar::<i64>().fetch_one(pool).await
}
