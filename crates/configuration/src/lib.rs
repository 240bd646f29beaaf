use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Analysis, Binance, Cache, CoinGecko, Comparison, Config, Defaults, Display, Logging,
    Providers, Server,
};

/// Name (without extension) of the configuration file picked up from the working directory.
pub const LOCAL_CONFIG_NAME: &str = "microanalyst";
/// Prefix for environment overrides, e.g. `MICROANALYST__DEFAULTS__DAYS=90`.
pub const ENV_PREFIX: &str = "MICROANALYST";
const ENV_SEPARATOR: &str = "__";

/// Loads the application configuration.
///
/// This function is the primary entry point for this crate. Sources are layered, later
/// ones overriding earlier ones:
///
/// 1. built-in defaults,
/// 2. `microanalyst.toml` in the working directory, if present,
/// 3. the explicit file at `path`, which must exist when given,
/// 4. `MICROANALYST__SECTION__KEY` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let env = config::Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);
    load_with_env(path, env)
}

fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(LOCAL_CONFIG_NAME).required(false));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    // Attempt to deserialize the layered sources into our `Config` struct
    let config = builder.add_source(env).build()?.try_deserialize::<Config>()?;

    validate(&config)?;
    tracing::debug!(?path, "Configuration loaded");
    Ok(config)
}

/// Rejects values that would only fail later, deep inside a request.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let defaults = &config.defaults;
    if defaults.days == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.days must be greater than zero".to_string(),
        ));
    }
    if !(1..=5000).contains(&defaults.depth_limit) {
        return Err(ConfigError::ValidationError(format!(
            "defaults.depth_limit must be between 1 and 5000, got {}",
            defaults.depth_limit
        )));
    }
    if !defaults.risk_free_rate.is_finite() {
        return Err(ConfigError::ValidationError(
            "defaults.risk_free_rate must be a finite number".to_string(),
        ));
    }
    for (name, url) in [
        ("providers.coingecko.base_url", &config.providers.coingecko.base_url),
        ("providers.binance.base_url", &config.providers.binance.base_url),
    ] {
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{name} cannot be empty")));
        }
    }
    Ok(())
}
