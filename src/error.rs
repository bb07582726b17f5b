//! Errors raised while building the model or its optimizer.

use thiserror::Error;

/// Errors that can occur while constructing the model or the optimizer.
#[derive(Debug, Error)]
pub enum VslNetError {
    /// Multi-head attention needs the model dimension to split evenly.
    #[error("model dimension {dim} is not divisible by the number of heads {num_heads}")]
    HeadsNotDivisible {
        /// Model dimension.
        dim: usize,
        /// Number of attention heads.
        num_heads: usize,
    },

    /// Pre-trained word vectors have the wrong width.
    #[error("word vectors have dimension {actual}, expected {expected}")]
    WordVectorDim {
        /// The configured `word_dim`.
        expected: usize,
        /// Width of the supplied vectors.
        actual: usize,
    },

    /// Invalid parameter provided.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter.
        message: String,
    },
}

impl VslNetError {
    /// Create an InvalidParameter error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

pub type Result<T, E = VslNetError> = std::result::Result<T, E>;
