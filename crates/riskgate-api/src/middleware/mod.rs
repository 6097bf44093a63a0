//! # Middleware
//!
//! - [`metrics`]: Prometheus request and assessment metrics.

pub mod metrics;
