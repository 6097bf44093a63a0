//! # API Route Modules
//!
//! - `assess`: proposal risk assessment (`/api/v1/assess-risks*`).
//! - `health`: dependency health and model listing (`/api/health`,
//!   `/api/models`).

pub mod assess;
pub mod health;
