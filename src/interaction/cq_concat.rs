use crate::interaction::{WeightedPool, WeightedPoolConfig};
use crate::utils::init::linear;
use burn::nn::Linear;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct CqConcatenateConfig {
    pub dim: usize,
}

impl CqConcatenateConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CqConcatenate<B> {
        CqConcatenate {
            pool: WeightedPoolConfig::new(self.dim).init(device),
            projection: linear(2 * self.dim, self.dim, true, device),
        }
    }
}

/// Appends the pooled query to every clip and projects back to `dim`.
#[derive(Module, Debug)]
pub struct CqConcatenate<B: Backend> {
    pub pool: WeightedPool<B>,
    /// Input channel: 2 * dim.
    /// Output channel: dim.
    pub projection: Linear<B>,
}

impl<B: Backend> CqConcatenate<B> {
    /// # Shapes
    ///   - context [batch, clips, dim]
    ///   - query [batch, words, dim]
    ///   - q_mask [batch, words]
    ///   - Output [batch, clips, dim]
    pub fn forward(
        &self,
        context: Tensor<B, 3>,
        query: Tensor<B, 3>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch, clips, dim] = context.dims();

        let pooled = self
            .pool
            .forward(query, q_mask)
            .unsqueeze_dim::<3>(1)
            .expand([batch, clips, dim]);
        self.projection
            .forward(Tensor::cat(vec![context, pooled], 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn keeps_context_shape() {
        let device = Default::default();
        let concat = CqConcatenateConfig::new(8).init::<B>(&device);
        let context = Tensor::<B, 3>::random([2, 6, 8], Distribution::Default, &device);
        let query = Tensor::<B, 3>::random([2, 3, 8], Distribution::Default, &device);
        let q_mask = Tensor::<B, 2, Int>::ones([2, 3], &device).bool();

        assert_eq!(concat.forward(context, query, q_mask).dims(), [2, 6, 8]);
    }
}
