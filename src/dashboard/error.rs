use std::{error::Error, fmt, io};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;

/// The dashboard module's result type.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Failures while reporting or serving the network status.
#[derive(Debug)]
pub enum DashboardError {
    /// The listener could not be bound.
    Bind { addr: String, source: io::Error },
    /// An I/O error while serving requests.
    Io(io::Error),
    /// The network has no layers, so there is no input layer to read.
    NoLayers,
    /// The snapshot could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::NoLayers => write!(f, "network has no layers"),
            Self::Encode(e) => write!(f, "failed to encode status: {e}"),
        }
    }
}

impl Error for DashboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::NoLayers => None,
        }
    }
}

impl From<io::Error> for DashboardError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Handler failures never serve partial data, they surface as a 500.
impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        error!("status request failed: {self}");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
