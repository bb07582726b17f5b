use crate::error::{Result, VslNetError};
use crate::utils::init::xavier_param;
use burn::module::Param;
use burn::nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig};
use burn::prelude::*;

/// Word id reserved for padding. It always embeds to the zero vector.
pub const PAD_ID: i64 = 0;

#[derive(Config, Debug)]
pub struct WordEmbeddingConfig {
    /// Vocabulary size, including the padding and unknown-word ids.
    pub num_words: usize,
    pub word_dim: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl WordEmbeddingConfig {
    /// Returns a trainable embedding table.
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordEmbedding<B> {
        let table = EmbeddingConfig::new(self.num_words, self.word_dim).init(device);
        WordEmbedding {
            table: WordTable::Trainable(table),
            dropout: DropoutConfig::new(self.drop_rate).init(),
        }
    }

    /// Returns an embedding backed by frozen pre-trained vectors.
    ///
    /// Id `0` maps to a frozen zero row, id `1` to a trainable unknown-word row
    /// and id `i >= 2` to `vectors[i - 2]`.
    ///
    /// # Shapes
    ///   - vectors: `[n, word_dim]`
    pub fn init_pretrained<B: Backend>(
        &self,
        vectors: Tensor<B, 2>,
        device: &B::Device,
    ) -> Result<WordEmbedding<B>> {
        let [n, word_dim] = vectors.dims();
        if word_dim != self.word_dim {
            return Err(VslNetError::WordVectorDim {
                expected: self.word_dim,
                actual: word_dim,
            });
        }
        if n + 2 != self.num_words {
            tracing::warn!(
                vectors = n,
                num_words = self.num_words,
                "pre-trained vector count does not match the vocabulary size"
            );
        }

        let pretrained = PretrainedWords {
            pad: Param::from_tensor(Tensor::zeros([1, word_dim], device)).set_require_grad(false),
            unk: xavier_param([1, word_dim], word_dim, 1, device),
            vectors: Param::from_tensor(vectors.to_device(device)).set_require_grad(false),
        };
        Ok(WordEmbedding {
            table: WordTable::Pretrained(pretrained),
            dropout: DropoutConfig::new(self.drop_rate).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct WordEmbedding<B: Backend> {
    pub table: WordTable<B>,
    pub dropout: Dropout,
}

#[derive(Module, Debug)]
pub enum WordTable<B: Backend> {
    Trainable(Embedding<B>),
    Pretrained(PretrainedWords<B>),
}

/// Lookup table made of `[pad, unk, vectors]`, with only `unk` trainable.
#[derive(Module, Debug)]
pub struct PretrainedWords<B: Backend> {
    /// Dims: [1, word_dim].
    pub pad: Param<Tensor<B, 2>>,
    /// Dims: [1, word_dim].
    pub unk: Param<Tensor<B, 2>>,
    /// Dims: [n, word_dim].
    pub vectors: Param<Tensor<B, 2>>,
}

impl<B: Backend> PretrainedWords<B> {
    pub fn forward(&self, word_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let weights = Tensor::cat(
            vec![self.pad.val(), self.unk.val(), self.vectors.val()],
            0,
        );
        burn::tensor::module::embedding(weights, word_ids)
    }
}

impl<B: Backend> WordEmbedding<B> {
    pub fn word_dim(&self) -> usize {
        match &self.table {
            WordTable::Trainable(table) => table.weight.dims()[1],
            WordTable::Pretrained(pretrained) => pretrained.unk.dims()[1],
        }
    }

    /// # Shapes
    ///   - Input [batch, words]
    ///   - Output [batch, words, word_dim]
    pub fn forward(&self, word_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, words] = word_ids.dims();
        let word_dim = self.word_dim();

        let padding = word_ids.clone().equal_elem(PAD_ID);
        let x = match &self.table {
            WordTable::Trainable(table) => table.forward(word_ids),
            WordTable::Pretrained(pretrained) => pretrained.forward(word_ids),
        };
        debug_assert_eq!([batch, words, word_dim], x.dims());

        // padding rows neither contribute nor receive gradient
        let padding = padding
            .unsqueeze_dim::<3>(2)
            .expand([batch, words, word_dim]);
        let x = x.mask_fill(padding, 0.0);

        self.dropout.forward(x)
    }
}
