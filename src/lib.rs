//! A read-only JSON status endpoint for a feed-forward neural network.
//!
//! [`dashboard::StatusReporter`] serves `GET /status` from a shared handle to
//! any [`dashboard::NetworkView`]; [`network::Network`] is the network this
//! crate trains and reports on.

pub mod config;
pub mod dashboard;
pub mod network;

pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{Dashboard, DashboardError, NetworkView, StatusReporter};
pub use network::{Network, NetworkError, SharedNetwork};
