//! Read-only status reporting for a network owned elsewhere.
//!
//! The dashboard never mutates the network. Every request recomputes a
//! [`Dashboard`] snapshot from the current state behind the shared handle.

mod error;
mod server;

use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use error::{DashboardError, Result};
pub use server::{STATUS_ROUTE, StatusReporter, bind};

/// The state the dashboard reads from a network.
pub trait NetworkView {
    /// Ordered node layers; `layers()[0]` is the input layer.
    fn layers(&self) -> &[Array2<f64>];

    /// The output matrix, one column per output node.
    fn output(&self) -> &Array2<f64>;

    fn rate(&self) -> f64;

    fn error(&self) -> f64;

    /// Accumulated training time in seconds.
    fn time(&self) -> f64;
}

/// A point-in-time report of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub layers: Layers,
    pub training: Training,
}

/// Node counts of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layers {
    #[serde(rename = "input")]
    pub input_nodes: usize,
    /// Signed: a single-layer network reports `-1`.
    #[serde(rename = "hidden")]
    pub hidden_layers: i64,
    #[serde(rename = "output")]
    pub output_nodes: usize,
}

/// Training progress of the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub rate: f64,
    pub error: f64,
    pub time: f64,
}

impl Layers {
    /// Counts the input nodes, hidden layers and output nodes of `network`.
    ///
    /// # Errors
    /// Returns `NoLayers` if the network has no input layer to read.
    pub fn of<N: NetworkView + ?Sized>(network: &N) -> Result<Self> {
        let layers = network.layers();
        let input = layers.first().ok_or(DashboardError::NoLayers)?;

        let hidden_layers = layers.len() as i64 - 2;
        if hidden_layers < 0 {
            warn!(
                layers = layers.len();
                "network has fewer than two layers, reporting a negative hidden count"
            );
        }

        Ok(Self {
            input_nodes: input.nrows(),
            hidden_layers,
            output_nodes: network.output().ncols(),
        })
    }
}

impl Training {
    pub fn of<N: NetworkView + ?Sized>(network: &N) -> Self {
        Self {
            rate: network.rate(),
            error: network.error(),
            time: network.time(),
        }
    }
}

/// Builds the dashboard snapshot of `network`.
///
/// # Errors
/// Returns `NoLayers` if the network has no layers.
pub fn snapshot<N: NetworkView + ?Sized>(network: &N) -> Result<Dashboard> {
    Ok(Dashboard {
        layers: Layers::of(network)?,
        training: Training::of(network),
    })
}
