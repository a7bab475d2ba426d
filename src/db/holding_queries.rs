use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::Holding;

/// Creates the holding row if missing and locks it for the rest of the
/// surrounding database transaction.
pub async fn lock_or_create(
    conn: &mut PgConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<Holding, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO holdings (id, user_id, symbol)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, symbol) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(symbol)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Holding>(
        "SELECT * FROM holdings WHERE user_id = $1 AND symbol = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_one(&mut *conn)
    .await
}

pub async fn lock(
    conn: &mut PgConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT * FROM holdings WHERE user_id = $1 AND symbol = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(conn)
    .await
}

pub async fn save<'e, E>(executor: E, holding: &Holding) -> Result<Holding, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Holding>(
        r#"
        UPDATE holdings
        SET total_shares = $1,
            average_buy_price = $2,
            total_invested = $3,
            current_price = $4,
            current_value = $5,
            profit_loss = $6,
            profit_loss_percent = $7,
            last_updated = $8
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(holding.total_shares)
    .bind(holding.average_buy_price)
    .bind(holding.total_invested)
    .bind(holding.current_price)
    .bind(holding.current_value)
    .bind(holding.profit_loss)
    .bind(holding.profit_loss_percent)
    .bind(holding.last_updated)
    .bind(holding.id)
    .fetch_one(executor)
    .await
}

pub async fn fetch_open(pool: &PgPool, user_id: Uuid) -> Result<Vec<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        r#"
        SELECT * FROM holdings
        WHERE user_id = $1 AND total_shares > 0
        ORDER BY symbol ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_one(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>("SELECT * FROM holdings WHERE user_id = $1 AND symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(pool)
        .await
}

pub async fn delete(conn: &mut PgConnection, user_id: Uuid, symbol: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM holdings WHERE user_id = $1 AND symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
