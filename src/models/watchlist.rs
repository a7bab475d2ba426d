use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::StoredAnalysis;

/// A tracked symbol with its last analysis, independent of holdings.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistStock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub added_at: DateTime<Utc>,
    pub last_analysis: Option<Json<StoredAnalysis>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddWatchlistRequest {
    pub symbol: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedFromWatchlist {
    pub message: String,
    pub symbol: String,
}
