//! Failures of the live route provider.
//!
//! None of these leave [`RouteSource`](crate::route_source::RouteSource): each
//! one is logged and answered with the bundled fallback route.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// Endpoint unreachable or answered with a non-success status
    #[error("live provider unreachable: {0}")]
    NetworkFailure(String),
    /// Payload is missing required fields or is not the expected shape
    #[error("live payload does not match the expected schema: {0}")]
    SchemaMismatch(String),
    /// Mapping produced too few waypoints to form a route
    #[error("live route has {waypoints} waypoint(s)")]
    EmptyRoute { waypoints: usize },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::NetworkFailure(e.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::SchemaMismatch(e.to_string())
    }
}
