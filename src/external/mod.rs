pub mod quote_provider;
pub mod twelvedata;
