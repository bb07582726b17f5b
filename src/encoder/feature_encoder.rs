use crate::encoder::*;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct FeatureEncoderConfig {
    pub dim: usize,
    pub num_heads: usize,
    pub max_pos_len: usize,
    #[config(default = 7)]
    pub kernel_size: usize,
    #[config(default = 4)]
    pub num_layers: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
    /// Query conditioning applied by [FeatureEncoder::forward_conditioned].
    #[config(default = "FilmMode::Disabled")]
    pub film_mode: FilmMode,
}

impl FeatureEncoderConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureEncoder<B> {
        FeatureEncoder {
            positional: PositionalEmbeddingConfig::new(self.max_pos_len, self.dim).init(device),
            conv_block: DepthwiseSeparableConvBlockConfig::new(self.dim)
                .with_kernel_size(self.kernel_size)
                .with_num_layers(self.num_layers)
                .with_drop_rate(self.drop_rate)
                .init(device),
            attention_block: MultiHeadAttentionBlockConfig::new(self.dim, self.num_heads)
                .with_drop_rate(self.drop_rate)
                .init(device),
            film: FilmGeneratorConfig::new(self.dim, self.film_mode).init(device),
        }
    }
}

/// Positional embedding, convolution block and self-attention block.
///
/// The same encoder (same weights) is applied to the query and to the video.
#[derive(Module, Debug)]
pub struct FeatureEncoder<B: Backend> {
    pub positional: PositionalEmbedding<B>,
    pub conv_block: DepthwiseSeparableConvBlock<B>,
    pub attention_block: MultiHeadAttentionBlock<B>,
    /// Present unless FiLM is disabled.
    pub film: Option<FilmGenerator<B>>,
}

impl<B: Backend> FeatureEncoder<B> {
    /// See also [`Self::forward_conditioned`].
    ///
    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - mask [batch, sequence]
    ///   - Output [batch, sequence, dim]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        self.encode(x, mask, None)
    }

    /// Like [`Self::forward`], modulating the features with the encoded query
    /// when FiLM is enabled.
    ///
    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - mask [batch, sequence]
    ///   - query [batch, words, dim]
    ///   - q_mask [batch, words]
    ///   - Output [batch, sequence, dim]
    pub fn forward_conditioned(
        &self,
        x: Tensor<B, 3>,
        mask: Tensor<B, 2, Bool>,
        query: Tensor<B, 3>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        self.encode(x, mask, Some((query, q_mask)))
    }

    fn encode(
        &self,
        x: Tensor<B, 3>,
        mask: Tensor<B, 2, Bool>,
        condition: Option<(Tensor<B, 3>, Tensor<B, 2, Bool>)>,
    ) -> Tensor<B, 3> {
        let [batch, sequence, dim] = x.dims();
        let device = x.device();
        let (pre, post) = match self.film.as_ref().zip(condition) {
            Some((film, condition)) => match film.mode() {
                FilmMode::Pre => (Some((film, condition)), None),
                FilmMode::Post => (None, Some((film, condition))),
                FilmMode::Disabled => (None, None),
            },
            None => (None, None),
        };

        let mut x = x + self.positional.forward(batch, sequence, &device);
        if let Some((film, (query, q_mask))) = pre {
            x = film.forward(x, query, q_mask);
        }

        let x = self.conv_block.forward(x);
        let mut x = self.attention_block.forward(x, Some(mask));
        if let Some((film, (query, q_mask))) = post {
            x = film.forward(x, query, q_mask);
        }
        debug_assert_eq!([batch, sequence, dim], x.dims());

        x
    }
}
