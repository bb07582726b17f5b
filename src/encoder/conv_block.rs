use crate::utils::init::{conv1d, linear};
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, PaddingConfig1d, Relu};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct DepthwiseSeparableConvBlockConfig {
    pub dim: usize,
    /// Must be odd so that the sequence length is preserved.
    #[config(default = 7)]
    pub kernel_size: usize,
    #[config(default = 4)]
    pub num_layers: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl DepthwiseSeparableConvBlockConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DepthwiseSeparableConvBlock<B> {
        assert_eq!(self.kernel_size % 2, 1, "kernel_size must be odd");

        let layers = (0..self.num_layers)
            .map(|_| DepthwiseSeparableConv {
                norm: LayerNormConfig::new(self.dim)
                    .with_epsilon(1e-6)
                    .init(device),
                depthwise: conv1d(
                    Conv1dConfig::new(self.dim, self.dim, self.kernel_size)
                        .with_groups(self.dim)
                        .with_padding(PaddingConfig1d::Explicit(self.kernel_size / 2))
                        .with_bias(false),
                    device,
                ),
                pointwise: linear(self.dim, self.dim, true, device),
            })
            .collect();

        DepthwiseSeparableConvBlock {
            layers,
            activation: Relu::new(),
            dropout: DropoutConfig::new(self.drop_rate).init(),
        }
    }
}

/// One residual layer of [DepthwiseSeparableConvBlock].
#[derive(Module, Debug)]
pub struct DepthwiseSeparableConv<B: Backend> {
    pub norm: LayerNorm<B>,
    /// Input channel: dim.
    /// Output channel: dim.
    /// Groups: dim.
    pub depthwise: Conv1d<B>,
    /// Input channel: dim.
    /// Output channel: dim.
    pub pointwise: Linear<B>,
}

/// Stack of pre-norm residual depthwise-separable convolutions.
#[derive(Module, Debug)]
pub struct DepthwiseSeparableConvBlock<B: Backend> {
    pub layers: Vec<DepthwiseSeparableConv<B>>,
    pub activation: Relu,
    pub dropout: Dropout,
}

impl<B: Backend> DepthwiseSeparableConvBlock<B> {
    /// # Shapes
    ///   - Input [batch, sequence, dim]
    ///   - Output [batch, sequence, dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, sequence, dim] = x.dims();

        let mut x = x;
        for layer in self.layers.iter() {
            let res = x.clone();
            let y = layer.norm.forward(x);

            let y = layer.depthwise.forward(y.swap_dims(1, 2)).swap_dims(1, 2);
            debug_assert_eq!([batch, sequence, dim], y.dims());

            let y = self.activation.forward(layer.pointwise.forward(y));
            x = self.dropout.forward(y) + res;
        }

        x
    }
}
