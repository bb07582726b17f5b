use burn::nn::{Embedding, EmbeddingConfig};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct PositionalEmbeddingConfig {
    /// Longest sequence that can be embedded.
    pub max_pos_len: usize,
    pub dim: usize,
}

impl PositionalEmbeddingConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEmbedding<B> {
        PositionalEmbedding {
            embedding: EmbeddingConfig::new(self.max_pos_len, self.dim).init(device),
        }
    }
}

/// Learned absolute position embedding.
#[derive(Module, Debug)]
pub struct PositionalEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
}

impl<B: Backend> PositionalEmbedding<B> {
    /// Embeddings of positions `0..sequence`, one copy per batch item.
    ///
    /// Panics if `sequence` exceeds `max_pos_len`.
    ///
    /// # Shapes
    ///   - Output [batch, sequence, dim]
    pub fn forward(&self, batch: usize, sequence: usize, device: &B::Device) -> Tensor<B, 3> {
        let [max_pos_len, _dim] = self.embedding.weight.dims();
        assert!(
            sequence <= max_pos_len,
            "sequence length {sequence} exceeds max_pos_len {max_pos_len}"
        );

        let positions = Tensor::<B, 1, Int>::arange(0..sequence as i64, device)
            .unsqueeze::<2>()
            .expand([batch, sequence]);
        self.embedding.forward(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn every_batch_item_gets_the_same_positions() {
        let device = Default::default();
        let positional = PositionalEmbeddingConfig::new(16, 4).init::<B>(&device);

        let x = positional.forward(3, 5, &device);
        assert_eq!(x.dims(), [3, 5, 4]);

        let first = x.clone().slice([0..1, 0..5, 0..4]);
        let last = x.slice([2..3, 0..5, 0..4]);
        let diff = (first - last).abs().sum().into_scalar();
        assert_eq!(diff, 0.0);
    }

    #[test]
    #[should_panic(expected = "exceeds max_pos_len")]
    fn rejects_sequences_longer_than_the_table() {
        let device = Default::default();
        let positional = PositionalEmbeddingConfig::new(4, 4).init::<B>(&device);
        positional.forward(1, 5, &device);
    }
}
