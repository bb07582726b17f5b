//! Teacher VSLNet for natural-language video grounding.
//!
//! Given pre-extracted video clip features and a tokenized query, the model
//! predicts the start and end clip of the moment the query describes, along
//! with a per-clip highlight score. It is used as the teacher network of a
//! knowledge-distillation setup.

pub mod embedding;
pub mod encoder;
pub mod error;
pub mod interaction;
pub mod model;
pub mod optim;
pub mod predictor;
pub mod utils;

pub mod prelude {
    pub use crate::embedding::*;
    pub use crate::encoder::*;
    pub use crate::error::{Result, VslNetError};
    pub use crate::interaction::*;
    pub use crate::model::*;
    pub use crate::optim::*;
    pub use crate::predictor::*;
}
