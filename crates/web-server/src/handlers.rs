use crate::{error::AppError, AppState};
use api_client::{ExchangeClient, MarketDataProvider};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use engine::{compare_reports, ComparisonOutcome, NoProgress, TokenReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    pub days: Option<u32>,
    pub reference_cv: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareParams {
    /// Comma-separated token queries.
    #[serde(default)]
    pub tokens: String,
    pub days: Option<u32>,
    /// Comma-separated metric names; the configured defaults when absent.
    pub metrics: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FailedToken {
    pub token: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    #[serde(flatten)]
    pub outcome: ComparisonOutcome,
    /// Tokens that could not be analysed and were left out of the comparison.
    pub failed: Vec<FailedToken>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolve_days(requested: Option<u32>, default: u32) -> Result<u32, AppError> {
    match requested {
        Some(0) => Err(AppError::BadRequest("days must be greater than zero".to_string())),
        Some(days) => Ok(days),
        None => Ok(default),
    }
}

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// # GET /api/analyze/:token
/// Runs the full single-token analysis.
pub async fn analyze_token<M, E>(
    Path(token): Path<String>,
    Query(params): Query<AnalyzeParams>,
    State(state): State<Arc<AppState<M, E>>>,
) -> Result<Json<TokenReport>, AppError>
where
    M: MarketDataProvider + 'static,
    E: ExchangeClient + 'static,
{
    let days = resolve_days(params.days, state.default_days)?;
    tracing::info!(token = %token, days, "HTTP analyze request");
    let report = state
        .analyzer
        .analyze(&token, days, params.reference_cv, &NoProgress)
        .await?;
    Ok(Json(report))
}

/// # GET /api/compare
/// Analyses every requested token concurrently and compares the ones that succeeded.
pub async fn compare_tokens<M, E>(
    Query(params): Query<CompareParams>,
    State(state): State<Arc<AppState<M, E>>>,
) -> Result<Json<CompareResponse>, AppError>
where
    M: MarketDataProvider + 'static,
    E: ExchangeClient + 'static,
{
    let tokens = split_list(&params.tokens);
    if tokens.is_empty() {
        return Err(AppError::BadRequest("at least one token is required".to_string()));
    }
    let days = resolve_days(params.days, state.default_days)?;
    let metrics = match params.metrics.as_deref().map(split_list) {
        Some(metrics) if !metrics.is_empty() => metrics,
        _ => state.default_metrics.clone(),
    };
    tracing::info!(tokens = ?tokens, days, "HTTP compare request");

    let results = state.analyzer.analyze_many(&tokens, days, None, &NoProgress).await;

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (token, result) in tokens.into_iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Token left out of comparison");
                failed.push(FailedToken { token, error: e.to_string() });
            }
        }
    }

    Ok(Json(CompareResponse {
        outcome: compare_reports(&reports, &metrics),
        failed,
    }))
}
