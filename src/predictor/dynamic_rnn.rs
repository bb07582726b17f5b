use crate::utils::init::lstm;
use burn::nn::Lstm;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct DynamicRnnConfig {
    pub dim: usize,
}

impl DynamicRnnConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DynamicRnn<B> {
        DynamicRnn {
            lstm: lstm(self.dim, self.dim, device),
        }
    }
}

/// Unidirectional LSTM whose outputs are zeroed past the valid positions.
#[derive(Module, Debug)]
pub struct DynamicRnn<B: Backend> {
    pub lstm: Lstm<B>,
}

impl<B: Backend> DynamicRnn<B> {
    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - mask [batch, sequence]
    ///   - Output [batch, sequence, dim]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let [batch, sequence, dim] = x.dims();

        let (output, _state) = self.lstm.forward(x, None);
        debug_assert_eq!([batch, sequence, dim], output.dims());

        let mask = mask.float().reshape([batch, sequence, 1]).expand([batch, sequence, dim]);
        output * mask
    }
}
