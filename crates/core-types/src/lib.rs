//! # Microanalyst Core Types
//!
//! Layer 0 of the workspace: the plain data structures every other crate speaks.
//! Nothing in here performs I/O or computation beyond trivial accessors.

pub mod enums;
pub mod error;
pub mod metrics;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Trend;
pub use error::CoreError;
pub use metrics::{MetricResult, MetricValue};
pub use structs::{BookLevel, OrderBookSnapshot, PricePoint, PriceSeries, VolumePoint, VolumeSeries};
