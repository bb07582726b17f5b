use crate::embedding::{CharacterEmbedding, CharacterEmbeddingConfig, WordEmbedding, WordEmbeddingConfig};
use crate::error::Result;
use crate::utils::init::linear;
use burn::nn::Linear;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct QueryEmbeddingConfig {
    pub num_words: usize,
    pub num_chars: usize,
    pub word_dim: usize,
    pub char_dim: usize,
    /// Output dimension.
    pub dim: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl QueryEmbeddingConfig {
    /// Returns the initialized model.
    ///
    /// With `word_vectors`, the word table is built from frozen pre-trained
    /// vectors of shape `[n, word_dim]`.
    pub fn init<B: Backend>(
        &self,
        word_vectors: Option<Tensor<B, 2>>,
        device: &B::Device,
    ) -> Result<QueryEmbedding<B>> {
        let words = WordEmbeddingConfig::new(self.num_words, self.word_dim)
            .with_drop_rate(self.drop_rate);
        let word = match word_vectors {
            Some(vectors) => words.init_pretrained(vectors, device)?,
            None => words.init(device),
        };
        let char = CharacterEmbeddingConfig::new(self.num_chars, self.char_dim)
            .with_drop_rate(self.drop_rate)
            .init(device);
        let projection = linear(
            self.word_dim + CharacterEmbedding::<B>::output_dim(),
            self.dim,
            true,
            device,
        );

        Ok(QueryEmbedding {
            word,
            char,
            projection,
        })
    }
}

/// Query token features: word and character embeddings, concatenated and
/// projected to the model dimension.
#[derive(Module, Debug)]
pub struct QueryEmbedding<B: Backend> {
    pub word: WordEmbedding<B>,
    pub char: CharacterEmbedding<B>,
    /// Input channel: word_dim + 100.
    /// Output channel: dim.
    pub projection: Linear<B>,
}

impl<B: Backend> QueryEmbedding<B> {
    /// # Shapes
    ///   - word_ids [batch, words]
    ///   - char_ids [batch, words, chars]
    ///   - Output [batch, words, dim]
    pub fn forward(&self, word_ids: Tensor<B, 2, Int>, char_ids: Tensor<B, 3, Int>) -> Tensor<B, 3> {
        let [batch, words] = word_ids.dims();
        debug_assert_eq!([batch, words], [char_ids.dims()[0], char_ids.dims()[1]]);
        let [_, dim] = self.projection.weight.dims();

        let word = self.word.forward(word_ids);
        let char = self.char.forward(char_ids);
        let x = self.projection.forward(Tensor::cat(vec![word, char], 2));
        debug_assert_eq!([batch, words, dim], x.dims());

        x
    }
}
