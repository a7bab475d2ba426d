use sqlx::PgPool;

use crate::auth::AuthConfig;
use crate::services::quote_service::QuoteService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub quotes: QuoteService,
    pub auth: AuthConfig,
}
