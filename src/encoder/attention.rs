use crate::utils::init::linear;
use crate::utils::mask_logits;
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear};
use burn::prelude::*;
use burn::tensor::activation::softmax;

#[derive(Config, Debug)]
pub struct MultiHeadAttentionBlockConfig {
    pub dim: usize,
    /// Must divide `dim`.
    pub num_heads: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl MultiHeadAttentionBlockConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiHeadAttentionBlock<B> {
        assert_eq!(
            self.dim % self.num_heads,
            0,
            "dim must be divisible by num_heads"
        );
        let norm = || {
            LayerNormConfig::new(self.dim)
                .with_epsilon(1e-6)
                .init(device)
        };

        MultiHeadAttentionBlock {
            query: linear(self.dim, self.dim, true, device),
            key: linear(self.dim, self.dim, true, device),
            value: linear(self.dim, self.dim, true, device),
            output: linear(self.dim, self.dim, true, device),
            norm_attention: norm(),
            norm_output: norm(),
            dropout: DropoutConfig::new(self.drop_rate).init(),
            num_heads: self.num_heads,
        }
    }
}

/// Pre-norm multi-head self-attention followed by a pre-norm projection,
/// each wrapped in a residual connection.
#[derive(Module, Debug)]
pub struct MultiHeadAttentionBlock<B: Backend> {
    pub query: Linear<B>,
    pub key: Linear<B>,
    pub value: Linear<B>,
    pub output: Linear<B>,
    pub norm_attention: LayerNorm<B>,
    pub norm_output: LayerNorm<B>,
    pub dropout: Dropout,
    pub num_heads: usize,
}

impl<B: Backend> MultiHeadAttentionBlock<B> {
    /// # Shapes
    ///   - Input [batch, sequence, dim]
    ///   - Output [batch, num_heads, sequence, head_dim]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, sequence, dim] = x.dims();
        x.reshape([batch, sequence, self.num_heads, dim / self.num_heads])
            .swap_dims(1, 2)
    }

    /// Keys whose `mask` is `false` receive no attention.
    ///
    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - mask [batch, sequence]
    ///   - Output [batch, sequence, dim]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Option<Tensor<B, 2, Bool>>) -> Tensor<B, 3> {
        let [batch, sequence, dim] = x.dims();
        let head_dim = dim / self.num_heads;

        let y = self.dropout.forward(self.norm_attention.forward(x.clone()));
        let query = self.split_heads(self.query.forward(y.clone()));
        let key = self.split_heads(self.key.forward(y.clone()));
        let value = self.split_heads(self.value.forward(y));

        let scores = query.matmul(key.swap_dims(2, 3)) / (head_dim as f64).sqrt();
        debug_assert_eq!([batch, self.num_heads, sequence, sequence], scores.dims());
        let scores = match mask {
            Some(mask) => {
                let mask = mask.reshape([batch, 1, 1, sequence]).expand([
                    batch,
                    self.num_heads,
                    sequence,
                    sequence,
                ]);
                mask_logits(scores, mask)
            }
            None => scores,
        };
        let probs = self.dropout.forward(softmax(scores, 3));

        let context = probs
            .matmul(value)
            .swap_dims(1, 2)
            .reshape([batch, sequence, dim]);

        let res = self.dropout.forward(context) + x;
        let y = self.dropout.forward(self.norm_output.forward(res.clone()));
        let y = self.output.forward(y);

        self.dropout.forward(y) + res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type B = NdArray;

    #[test]
    fn preserves_shape() {
        let device = Default::default();
        let block = MultiHeadAttentionBlockConfig::new(8, 2).init::<B>(&device);
        let x = Tensor::<B, 3>::random([2, 5, 8], Distribution::Default, &device);
        assert_eq!(block.forward(x, None).dims(), [2, 5, 8]);
    }

    #[test]
    fn masked_keys_do_not_influence_valid_positions() {
        let device = Default::default();
        let block = MultiHeadAttentionBlockConfig::new(8, 2).init::<B>(&device);
        let mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::from([[true, true, true, false, false]]),
            &device,
        );

        let x = Tensor::<B, 3>::random([1, 5, 8], Distribution::Default, &device);
        let noise = Tensor::<B, 3>::random([1, 2, 8], Distribution::Default, &device);
        let perturbed = x.clone().slice_assign([0..1, 3..5, 0..8], noise);

        let a = block.forward(x, Some(mask.clone())).slice([0..1, 0..3, 0..8]);
        let b = block.forward(perturbed, Some(mask)).slice([0..1, 0..3, 0..8]);
        let diff = (a - b).abs().max().into_scalar();
        assert!(diff < 1e-5, "diff = {diff}");
    }

    #[test]
    #[should_panic(expected = "divisible by num_heads")]
    fn heads_must_divide_dim() {
        let device = Default::default();
        MultiHeadAttentionBlockConfig::new(10, 4).init::<B>(&device);
    }
}
