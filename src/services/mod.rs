pub mod analysis_service;
pub mod auth_service;
pub mod job_scheduler_service;
pub mod portfolio_service;
pub mod quote_cache;
pub mod quote_service;
pub mod symbols;
pub mod watchlist_service;
