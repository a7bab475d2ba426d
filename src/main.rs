use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use stockcrypt_backend::app;
use stockcrypt_backend::auth::AuthConfig;
use stockcrypt_backend::config::AppConfig;
use stockcrypt_backend::external::twelvedata::TwelveDataProvider;
use stockcrypt_backend::logging::{self, LoggingConfig};
use stockcrypt_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use stockcrypt_backend::services::quote_cache::QuoteCache;
use stockcrypt_backend::services::quote_service::QuoteService;
use stockcrypt_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let provider = TwelveDataProvider::new(
        config.twelve_data_base_url.clone(),
        config.twelve_data_api_key.clone(),
    );
    let quotes = QuoteService::new(
        Arc::new(provider),
        QuoteCache::new(config.quote_cache_ttl),
    );

    let mut scheduler = JobSchedulerService::new(JobContext { quotes: quotes.clone() }).await?;
    scheduler.start(&config.quote_cache_cleanup_cron).await?;

    let state = AppState {
        pool,
        quotes,
        auth: AuthConfig::new(config.jwt_secret.clone()),
    };
    let app = app::create_app(state, &config.cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 StockCrypt backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
