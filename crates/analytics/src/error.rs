use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid indicator parameters: {0}")]
    InvalidParameters(String),

    #[error("Risk-free rate must be a finite number, got {0}")]
    InvalidRiskFreeRate(f64),
}
