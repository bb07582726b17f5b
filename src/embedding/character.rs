use crate::utils::init::conv2d;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Relu};
use burn::prelude::*;

/// Width of each character convolution, along the character axis.
pub const CHAR_KERNELS: [usize; 4] = [1, 2, 3, 4];
/// Output channels of each character convolution.
pub const CHAR_CHANNELS: [usize; 4] = [10, 20, 30, 40];

#[derive(Config, Debug)]
pub struct CharacterEmbeddingConfig {
    pub num_chars: usize,
    pub char_dim: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl CharacterEmbeddingConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CharacterEmbedding<B> {
        let convs = CHAR_KERNELS
            .iter()
            .zip(CHAR_CHANNELS)
            .map(|(&kernel, channels)| {
                conv2d(
                    Conv2dConfig::new([self.char_dim, channels], [1, kernel]),
                    device,
                )
            })
            .collect();

        CharacterEmbedding {
            embedding: EmbeddingConfig::new(self.num_chars, self.char_dim).init(device),
            convs,
            activation: Relu::new(),
            dropout: DropoutConfig::new(self.drop_rate).init(),
        }
    }
}

/// Character-level word features: a character embedding followed by
/// convolutions of increasing width, max-pooled over the characters of each word.
#[derive(Module, Debug)]
pub struct CharacterEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
    /// One convolution per entry of [CHAR_KERNELS].
    pub convs: Vec<Conv2d<B>>,
    pub activation: Relu,
    pub dropout: Dropout,
}

impl<B: Backend> CharacterEmbedding<B> {
    /// Sum of [CHAR_CHANNELS].
    pub fn output_dim() -> usize {
        CHAR_CHANNELS.iter().sum()
    }

    /// # Shapes
    ///   - Input [batch, words, chars]
    ///   - Output [batch, words, 100]
    pub fn forward(&self, char_ids: Tensor<B, 3, Int>) -> Tensor<B, 3> {
        let [batch, words, chars] = char_ids.dims();
        let [_num_chars, char_dim] = self.embedding.weight.dims();

        // the widest kernel needs at least as many characters as its width
        let min_chars = CHAR_KERNELS[CHAR_KERNELS.len() - 1];
        let (char_ids, chars) = if chars < min_chars {
            let padding = Tensor::zeros([batch, words, min_chars - chars], &char_ids.device());
            (Tensor::cat(vec![char_ids, padding], 2), min_chars)
        } else {
            (char_ids, chars)
        };

        let padding = char_ids
            .clone()
            .equal_elem(0)
            .reshape([batch * words, chars, 1])
            .expand([batch * words, chars, char_dim]);
        let x = self
            .embedding
            .forward(char_ids.reshape([batch * words, chars]))
            .mask_fill(padding, 0.0);
        let x = self.dropout.forward(x);

        // [batch, char_dim, words, chars]
        let x = x
            .reshape([batch, words, chars, char_dim])
            .permute([0, 3, 1, 2]);

        let mut outputs = Vec::with_capacity(self.convs.len());
        for conv in self.convs.iter() {
            let y = self.activation.forward(conv.forward(x.clone()));
            let [_, channels, _, _] = y.dims();
            let y = y.max_dim(3).reshape([batch, channels, words]);
            outputs.push(y);
        }

        let x = Tensor::cat(outputs, 1).swap_dims(1, 2);
        debug_assert_eq!([batch, words, Self::output_dim()], x.dims());
        x
    }
}
