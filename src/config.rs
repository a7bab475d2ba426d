use chrono::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TWELVE_DATA_BASE_URL: &str = "https://api.twelvedata.com";
const DEFAULT_QUOTE_CACHE_TTL_SECS: i64 = 300;
const DEFAULT_QUOTE_CACHE_CLEANUP_CRON: &str = "0 */5 * * * *";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:5177",
];
const DEFAULT_CORS_ORIGIN_SUFFIXES: &[&str] = &[".vercel.app"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_origin_suffixes: Vec<String>,
}

impl CorsConfig {
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
            || self
                .allowed_origin_suffixes
                .iter()
                .any(|suffix| origin.ends_with(suffix.as_str()))
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            allowed_origin_suffixes: DEFAULT_CORS_ORIGIN_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub jwt_secret: String,
    pub twelve_data_api_key: String,
    pub twelve_data_base_url: String,
    pub quote_cache_ttl: Duration,
    pub quote_cache_cleanup_cron: String,
    pub cors: CorsConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        let ttl_secs = parse_or(&lookup, "QUOTE_CACHE_TTL_SECS", DEFAULT_QUOTE_CACHE_TTL_SECS)?;
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "QUOTE_CACHE_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }

        let defaults = CorsConfig::default();
        let cors = CorsConfig {
            allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_origins),
            allowed_origin_suffixes: lookup("CORS_ALLOWED_ORIGIN_SUFFIXES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_origin_suffixes),
        };

        Ok(Self {
            database_url,
            db_max_connections,
            port,
            jwt_secret,
            twelve_data_api_key: lookup("TWELVE_DATA_API_KEY").unwrap_or_else(|| "demo".to_string()),
            twelve_data_base_url: lookup("TWELVE_DATA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TWELVE_DATA_BASE_URL.to_string()),
            quote_cache_ttl: Duration::seconds(ttl_secs),
            quote_cache_cleanup_cron: lookup("QUOTE_CACHE_CLEANUP_CRON")
                .unwrap_or_else(|| DEFAULT_QUOTE_CACHE_CLEANUP_CRON.to_string()),
            cors,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
