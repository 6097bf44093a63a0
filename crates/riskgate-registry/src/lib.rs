//! # riskgate-registry: Risk/Control Registry Boundary
//!
//! The registry is an external, authoritative, read-only store of risks and
//! their mitigating controls. This crate is the only path by which the
//! pipeline reads it.
//!
//! ## Implementations
//!
//! | Type | Backing |
//! |------|---------|
//! | [`HttpRegistryClient`] | Registry REST API (`/api/search`, `/api/relationships`, `/api/health`) |
//! | [`InMemoryRegistry`] | A [`Catalog`] loaded from JSON/YAML or the built-in seed |
//!
//! ## Trust Boundary
//!
//! Queries accept only [`Keyword`] and [`RiskId`] values. Free text from a
//! proposal or a model response cannot reach the registry without passing
//! through their validating constructors.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub(crate) mod retry;

pub use config::RegistryConfig;
pub use error::{CatalogError, RegistryError};
pub use http::HttpRegistryClient;
pub use memory::{Catalog, InMemoryRegistry};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use riskgate_core::{Control, Keyword, RiskId, RiskRecord};

/// Health status of a registry backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistryHealth {
    Healthy,
    Unavailable { reason: String },
}

impl RegistryHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for RegistryHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::Unavailable { reason } => write!(f, "Unavailable: {reason}"),
        }
    }
}

/// Read-only interface to the risk/control registry.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// concurrent assessments behind an `Arc`. The trait is object-safe to
/// support runtime selection (HTTP vs. in-memory).
#[async_trait]
pub trait RiskRegistry: Send + Sync {
    /// Risks matching one keyword, in registry-native relevance order.
    async fn find_risks_by_keyword(&self, keyword: &Keyword)
        -> Result<Vec<RiskRecord>, RegistryError>;

    /// Controls associated with one risk. An empty list is a valid answer.
    async fn get_controls(&self, risk_id: &RiskId) -> Result<Vec<Control>, RegistryError>;

    /// Probe the backend.
    async fn health_check(&self) -> RegistryHealth;

    /// Human-readable name of this implementation.
    fn name(&self) -> &str;
}
