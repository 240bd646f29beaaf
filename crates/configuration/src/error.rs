use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
