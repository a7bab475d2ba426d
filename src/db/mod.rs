pub mod holding_queries;
pub mod transaction_queries;
pub mod user_queries;
pub mod watchlist_queries;
