use crate::utils::init::linear;
use crate::utils::loss::bce::BinaryCrossEntropyLoss;
use crate::utils::mask_logits;
use burn::nn::Linear;
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

/// Added to the number of valid positions before dividing.
pub const EPSILON: f64 = 1e-12;

#[derive(Config, Debug)]
pub struct HighlightLayerConfig {
    pub dim: usize,
}

impl HighlightLayerConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> HighlightLayer<B> {
        HighlightLayer {
            projection: linear(self.dim, 1, true, device),
            bce: BinaryCrossEntropyLoss::default(),
        }
    }
}

/// Scores how likely each clip is to lie inside the queried moment.
#[derive(Module, Debug)]
pub struct HighlightLayer<B: Backend> {
    /// Input channel: dim.
    /// Output channel: 1.
    pub projection: Linear<B>,
    pub bce: BinaryCrossEntropyLoss,
}

impl<B: Backend> HighlightLayer<B> {
    /// Masked clips score exactly zero.
    ///
    /// # Shapes
    ///   - x [batch, clips, dim]
    ///   - mask [batch, clips]
    ///   - Output [batch, clips]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let [batch, clips, _dim] = x.dims();

        let logits = self.projection.forward(x).reshape([batch, clips]);
        sigmoid(mask_logits(logits, mask))
    }

    /// Weighted binary cross-entropy averaged over the valid clips.
    ///
    /// Positions labelled `0` weigh `1`, others weigh `2 * label`.
    ///
    /// # Shapes
    ///   - scores [batch, clips]
    ///   - labels [batch, clips]
    ///   - mask [batch, clips]
    ///   - Output [1]
    pub fn compute_loss(
        &self,
        scores: Tensor<B, 2>,
        labels: Tensor<B, 2>,
        mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 1> {
        let background = labels.clone().equal_elem(0.0);
        let weights = (labels.clone() * 2.0).mask_fill(background, 1.0);

        let per_clip = self.bce.forward_no_reduction(scores, labels) * weights;
        let mask = mask.float();
        (per_clip * mask.clone()).sum() / (mask.sum() + EPSILON)
    }
}
