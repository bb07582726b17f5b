//! Parameter initialization policy.
//!
//! Linear and convolution layers get Xavier-uniform weights and zero biases.
//! LSTMs are drawn from `U(-1/sqrt(hidden), 1/sqrt(hidden))`. Embedding tables
//! keep burn's default standard normal.

use burn::module::Param;
use burn::nn::conv::{Conv1d, Conv1dConfig, Conv2d, Conv2dConfig};
use burn::nn::{Initializer, Linear, LinearConfig, Lstm, LstmConfig};
use burn::prelude::*;

pub const XAVIER: Initializer = Initializer::XavierUniform { gain: 1.0 };

/// Pointwise projection over the last dimension.
///
/// # Shapes
///   - weight: `[d_input, d_output]`
///   - bias: `[d_output]`
pub fn linear<B: Backend>(
    d_input: usize,
    d_output: usize,
    bias: bool,
    device: &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output)
        .with_bias(bias)
        .with_initializer(XAVIER)
        .init(device);
    linear.bias = linear
        .bias
        .map(|_| Initializer::Zeros.init([d_output], device));
    linear
}

/// Fans follow the `[out, in / groups, kernel...]` weight layout:
/// `fan_in = in / groups * kernel` and `fan_out = out * kernel`.
pub fn conv1d<B: Backend>(config: Conv1dConfig, device: &B::Device) -> Conv1d<B> {
    let (channels_in, channels_out) = (config.channels_in, config.channels_out);
    let (kernel_size, groups) = (config.kernel_size, config.groups);
    let mut conv = config.init(device);
    conv.weight = xavier_param(
        [channels_out, channels_in / groups, kernel_size],
        channels_in / groups * kernel_size,
        channels_out * kernel_size,
        device,
    );
    conv.bias = conv
        .bias
        .map(|_| Initializer::Zeros.init([channels_out], device));
    conv
}

/// Same fan rule as [conv1d].
pub fn conv2d<B: Backend>(config: Conv2dConfig, device: &B::Device) -> Conv2d<B> {
    let [channels_in, channels_out] = config.channels;
    let [k0, k1] = config.kernel_size;
    let groups = config.groups;
    let mut conv = config.init(device);
    conv.weight = xavier_param(
        [channels_out, channels_in / groups, k0, k1],
        channels_in / groups * k0 * k1,
        channels_out * k0 * k1,
        device,
    );
    conv.bias = conv
        .bias
        .map(|_| Initializer::Zeros.init([channels_out], device));
    conv
}

/// Single layer, unidirectional, with biases.
pub fn lstm<B: Backend>(d_input: usize, d_hidden: usize, device: &B::Device) -> Lstm<B> {
    let bound = 1.0 / (d_hidden as f64).sqrt();
    LstmConfig::new(d_input, d_hidden, true)
        .with_initializer(Initializer::Uniform {
            min: -bound,
            max: bound,
        })
        .init(device)
}

/// A free-standing Xavier-uniform parameter.
///
/// `fan_in` and `fan_out` follow the tensor layout, e.g. a `[dim, 1]` column
/// has `fan_in = 1` and `fan_out = dim`.
pub fn xavier_param<B: Backend, const D: usize>(
    shape: [usize; D],
    fan_in: usize,
    fan_out: usize,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    XAVIER.init_with(shape, Some(fan_in), Some(fan_out), device)
}
