//! Error types.
//!
//! `PlannerError` is what callers of the planner operations see. Provider
//! failures are recovered inside the crate and only show up as reduced
//! confidence or a [`RouteSource::LocalEstimate`](crate::types::RouteSource).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Malformed coordinates, empty required lists, negative durations.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every candidate vehicle exceeds capacity, or there were no candidates.
    #[error("no viable vehicle: {0}")]
    NoViableVehicle(String),
}

/// Failure of an external mapping or geocoding provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("provider returned no routes")]
    NoRoutes,

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0} does not support this operation")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("unknown local ordering {0:?}, expected nearest_from_origin or nearest_neighbor_two_opt")]
    UnknownOrdering(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
