use api_client::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::error::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Engine(EngineError::TokenNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Engine(EngineError::ApiClient(ApiError::RateLimited(_))) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Engine(EngineError::ApiClient(ApiError::IpBanned)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Engine(EngineError::ApiClient(_)) => StatusCode::BAD_GATEWAY,
            AppError::Engine(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Engine(EngineError::TokenNotFound(_)) | AppError::BadRequest(_) => {
                self.to_string()
            }
            AppError::Engine(EngineError::ApiClient(api_err)) => {
                tracing::warn!(error = %api_err, "Upstream provider error.");
                format!("Upstream provider error: {api_err}")
            }
            AppError::Engine(engine_err) => {
                tracing::error!(error = ?engine_err, "Engine error.");
                "An error occurred during analysis".to_string()
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                "A server configuration error occurred".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
