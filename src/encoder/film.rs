use crate::utils::init::linear;
use burn::module::Ignored;
use burn::nn::Linear;
use burn::prelude::*;

/// Where the video encoder is modulated by the query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmMode {
    /// No query conditioning.
    #[default]
    Disabled,
    /// Modulate right after the positional embedding, before the convolutions.
    Pre,
    /// Modulate the output of the attention block.
    Post,
}

#[derive(Config, Debug)]
pub struct FilmGeneratorConfig {
    pub dim: usize,
    pub mode: FilmMode,
}

impl FilmGeneratorConfig {
    /// Returns the initialized model, or `None` when FiLM is disabled.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Option<FilmGenerator<B>> {
        match self.mode {
            FilmMode::Disabled => None,
            mode => Some(FilmGenerator {
                projection: linear(self.dim, 2 * self.dim, true, device),
                mode: Ignored(mode),
            }),
        }
    }
}

/// Feature-wise linear modulation conditioned on a pooled query.
///
/// `y = x * (1 + gamma) + beta`, where `[gamma, beta]` is a projection of the
/// masked mean of the query features.
#[derive(Module, Debug)]
pub struct FilmGenerator<B: Backend> {
    /// Input channel: dim.
    /// Output channel: 2 * dim.
    pub projection: Linear<B>,
    pub mode: Ignored<FilmMode>,
}

impl<B: Backend> FilmGenerator<B> {
    pub fn mode(&self) -> FilmMode {
        self.mode.0
    }

    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - query [batch, words, dim]
    ///   - q_mask [batch, words]
    ///   - Output [batch, sequence, dim]
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        query: Tensor<B, 3>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch, sequence, dim] = x.dims();
        let [_, words, _] = query.dims();

        let weights = q_mask.float().reshape([batch, words, 1]);
        let count = weights.clone().sum_dim(1).clamp_min(1.0);
        let pooled = (query * weights.expand([batch, words, dim])).sum_dim(1)
            / count.expand([batch, 1, dim]);
        debug_assert_eq!([batch, 1, dim], pooled.dims());

        let params = self.projection.forward(pooled);
        let gamma = params.clone().slice([0..batch, 0..1, 0..dim]);
        let beta = params.slice([0..batch, 0..1, dim..2 * dim]);

        x * (gamma + 1.0).expand([batch, sequence, dim]) + beta.expand([batch, sequence, dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type B = NdArray;

    #[test]
    fn disabled_mode_builds_nothing() {
        let device = Default::default();
        let film = FilmGeneratorConfig::new(8, FilmMode::Disabled).init::<B>(&device);
        assert!(film.is_none());
    }

    #[test]
    fn zero_projection_is_identity() {
        let device = Default::default();
        let mut film = FilmGeneratorConfig::new(4, FilmMode::Pre)
            .init::<B>(&device)
            .unwrap();
        film.projection.weight = film.projection.weight.map(|w| w.zeros_like());

        let x = Tensor::<B, 3>::random([2, 3, 4], Distribution::Default, &device);
        let query = Tensor::<B, 3>::random([2, 5, 4], Distribution::Default, &device);
        let q_mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::from([[true, true, false, false, false], [true; 5]]),
            &device,
        );

        let y = film.forward(x.clone(), query, q_mask);
        let diff = (y - x).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn padded_query_words_are_ignored() {
        let device = Default::default();
        let film = FilmGeneratorConfig::new(4, FilmMode::Post)
            .init::<B>(&device)
            .unwrap();
        let q_mask =
            Tensor::<B, 2, Bool>::from_data(TensorData::from([[true, true, false]]), &device);

        let x = Tensor::<B, 3>::random([1, 3, 4], Distribution::Default, &device);
        let query = Tensor::<B, 3>::random([1, 3, 4], Distribution::Default, &device);
        let noise = Tensor::<B, 3>::random([1, 1, 4], Distribution::Default, &device);
        let perturbed = query.clone().slice_assign([0..1, 2..3, 0..4], noise);

        let a = film.forward(x.clone(), query, q_mask.clone());
        let b = film.forward(x, perturbed, q_mask);
        assert!((a - b).abs().max().into_scalar() < 1e-6);
    }
}
