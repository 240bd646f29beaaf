//! # Microanalyst Cross-Token Comparator
//!
//! Ranks a small set of tokens against each other and measures how their prices move
//! together.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** Like `analytics`, this crate is pure and synchronous. It never
//!   fetches data; callers hand it a fully built `ComparisonSet`.
//! - **Forgiving Input:** Metric cells are raw JSON values. Anything that is not a
//!   finite number becomes a missing value, which propagates as `None`.
//!
//! ## Public API
//!
//! - `Comparator::compare`: summary statistics plus per-entity deviation, z-score and
//!   percentile rank.
//! - `correlation_matrix`: Pearson correlation of daily-resampled prices.

pub mod correlation;
pub mod entity;
pub mod error;
pub mod scoring;
pub mod stats;

pub use correlation::{correlation_matrix, daily_means, CorrelationMatrix};
pub use entity::{coerce_numeric, ComparisonEntity, ComparisonSet};
pub use error::ComparatorError;
pub use scoring::{ComparisonReport, Comparator, EntityScores, ScoredMetric};
pub use stats::MetricSummary;
