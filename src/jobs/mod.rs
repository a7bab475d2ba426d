//! Background jobs run by the job scheduler service.
//!
//! - `quote_cache_job` - drops expired entries from the in-process quote cache

pub mod quote_cache_job;
