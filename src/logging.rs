use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL"),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "stockcrypt".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }
}

/// Installs the global subscriber. Console output is always on; Loki is added
/// when the `loki` feature is compiled in and enabled at runtime.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let filter = EnvFilter::try_new(&config.log_level)?;

    #[cfg(feature = "loki")]
    if let (true, Some(loki_url)) = (config.loki_enabled, config.loki_url.as_deref()) {
        let loki_layer = loki_layer(&config, loki_url)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .with(loki_layer)
            .try_init()?;

        tracing::info!("✅ Loki logging initialized at {}", loki_url);
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    tracing::info!("📊 Console logging initialized ({})", config.environment);
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig, loki_url: &str) -> Result<tracing_loki::Layer, Box<dyn std::error::Error>> {
    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url::Url::parse(loki_url)?)?;

    // Ships buffered events to Loki
    tokio::spawn(task);
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loki_requires_url() {
        let config = LoggingConfig::from_lookup(|key| match key {
            "LOKI_ENABLED" => Some("true".to_string()),
            _ => None,
        });
        assert!(config.loki_enabled);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(|_| None);
        assert!(!config.loki_enabled);
        assert_eq!(config.service_name, "stockcrypt");
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        let config = LoggingConfig::from_lookup(|key| match key {
            "RUST_LOG" => Some("stockcrypt=loud".to_string()),
            _ => None,
        });
        assert!(init_logging(config).is_err());
    }
}
