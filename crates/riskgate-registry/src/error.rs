//! Registry client error types.

/// Errors from registry calls.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Registry returned a non-2xx status.
    #[error("registry {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The registry backend cannot serve requests.
    #[error("registry unavailable: {reason}")]
    Unavailable { reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

/// Errors loading a catalog for [`InMemoryRegistry`](crate::InMemoryRegistry).
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The same risk identifier appears twice.
    #[error("duplicate risk {0} in catalog")]
    DuplicateRisk(String),
    /// The same control identifier appears twice.
    #[error("duplicate control {0} in catalog")]
    DuplicateControl(String),
    /// A control references a risk the catalog does not define.
    #[error("control {control} references unknown risk {risk}")]
    UnknownRisk { control: String, risk: String },
}
