use std::{error::Error, fmt};

/// The network module's result type.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Failures while building or querying a `Network`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A network needs at least an input and an output layer.
    TooFewLayers { got: usize },
    /// Every layer must hold at least one node.
    ZeroSizedLayer { index: usize },
    /// A matrix or vector does not match the layer sizes.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLayers { got } => {
                write!(f, "a network needs at least 2 layers, got {got}")
            }
            Self::ZeroSizedLayer { index } => write!(f, "layer {index} has no nodes"),
            Self::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
        }
    }
}

impl Error for NetworkError {}
