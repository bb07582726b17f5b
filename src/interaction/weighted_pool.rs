use crate::utils::init::xavier_param;
use crate::utils::mask_logits;
use burn::module::Param;
use burn::prelude::*;
use burn::tensor::activation::softmax;

#[derive(Config, Debug)]
pub struct WeightedPoolConfig {
    pub dim: usize,
}

impl WeightedPoolConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> WeightedPool<B> {
        WeightedPool {
            weight: xavier_param([self.dim, 1], 1, self.dim, device),
        }
    }
}

/// Attention pooling: a learned score per position, softmax over the valid
/// positions, weighted sum of the features.
#[derive(Module, Debug)]
pub struct WeightedPool<B: Backend> {
    /// Dims: [dim, 1].
    pub weight: Param<Tensor<B, 2>>,
}

impl<B: Backend> WeightedPool<B> {
    /// # Shapes
    ///   - x [batch, sequence, dim]
    ///   - mask [batch, sequence]
    ///   - Output [batch, dim]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let [batch, sequence, dim] = x.dims();

        let weight = self.weight.val().reshape([1, 1, dim]).expand([batch, sequence, dim]);
        let alpha = (x.clone() * weight).sum_dim(2);
        let alpha = mask_logits(alpha, mask.reshape([batch, sequence, 1]));
        let alpha = softmax(alpha, 1);

        let pooled = x.swap_dims(1, 2).matmul(alpha);
        debug_assert_eq!([batch, dim, 1], pooled.dims());

        pooled.reshape([batch, dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type B = NdArray;

    #[test]
    fn single_valid_position_is_returned_as_is() {
        let device = Default::default();
        let pool = WeightedPoolConfig::new(2).init::<B>(&device);
        let x = Tensor::<B, 3>::from_floats([[[1.0, 2.0], [7.0, 9.0]]], &device);
        let mask = Tensor::<B, 2, Bool>::from_data(TensorData::from([[true, false]]), &device);

        let pooled = pool.forward(x, mask).into_data().to_vec::<f32>().unwrap();
        assert_eq!(pooled, vec![1.0, 2.0]);
    }

    #[test]
    fn uniform_scores_average_the_valid_positions() {
        let device = Default::default();
        let mut pool = WeightedPoolConfig::new(2).init::<B>(&device);
        pool.weight = pool.weight.map(|w| w.zeros_like());
        let x = Tensor::<B, 3>::from_floats([[[1.0, 2.0], [3.0, 4.0], [100.0, 100.0]]], &device);
        let mask =
            Tensor::<B, 2, Bool>::from_data(TensorData::from([[true, true, false]]), &device);

        let pooled = pool.forward(x, mask).into_data().to_vec::<f32>().unwrap();
        assert!((pooled[0] - 2.0).abs() < 1e-5);
        assert!((pooled[1] - 3.0).abs() < 1e-5);
    }
}
