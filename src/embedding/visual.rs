use crate::utils::init::linear;
use burn::nn::{Dropout, DropoutConfig, Linear};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct VisualProjectionConfig {
    /// Dimension of the pre-extracted clip features.
    pub visual_dim: usize,
    pub dim: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl VisualProjectionConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> VisualProjection<B> {
        VisualProjection {
            dropout: DropoutConfig::new(self.drop_rate).init(),
            projection: linear(self.visual_dim, self.dim, true, device),
        }
    }
}

#[derive(Module, Debug)]
pub struct VisualProjection<B: Backend> {
    pub dropout: Dropout,
    /// Input channel: visual_dim.
    /// Output channel: dim.
    pub projection: Linear<B>,
}

impl<B: Backend> VisualProjection<B> {
    /// # Shapes
    ///   - Input [batch, clips, visual_dim]
    ///   - Output [batch, clips, dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.dropout.forward(x);
        self.projection.forward(x)
    }
}
