//! # riskgate-registry-stub: Development Registry Server
//!
//! In-memory implementation of the registry REST API that
//! `riskgate_registry::HttpRegistryClient` calls. Serves a catalog file or
//! the built-in seed taxonomy. Read-only; nothing persists.
//!
//! | Method | Path |
//! |--------|------|
//! | GET | `/api/health` |
//! | GET | `/api/search?q=` |
//! | GET | `/api/relationships?risk_ids=` |
//! | GET | `/api/risks/:id` |

pub mod routes;
pub mod store;

pub use routes::router;
pub use store::StubStore;

/// Default listen port; matches the registry client's default URL.
pub const DEFAULT_PORT: u16 = 5001;
