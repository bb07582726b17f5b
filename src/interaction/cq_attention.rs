use crate::utils::init::{linear, xavier_param};
use crate::utils::mask_logits;
use burn::module::Param;
use burn::nn::{Dropout, DropoutConfig, Linear};
use burn::prelude::*;
use burn::tensor::activation::softmax;

#[derive(Config, Debug)]
pub struct CqAttentionConfig {
    pub dim: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
}

impl CqAttentionConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CqAttention<B> {
        let dim = self.dim;
        CqAttention {
            w_context: xavier_param([dim, 1], 1, dim, device),
            w_query: xavier_param([dim, 1], 1, dim, device),
            w_mul: xavier_param([1, 1, dim], dim, dim, device),
            dropout: DropoutConfig::new(self.drop_rate).init(),
            projection: linear(4 * dim, dim, true, device),
        }
    }
}

/// Context-query attention.
///
/// The similarity between video position `i` and query word `j` is the
/// trilinear function `w_c . c_i + w_q . q_j + (c_i * w_m) . q_j`. It is
/// normalized over words (context-to-query) and over positions
/// (query-to-context), and the attended vectors are fused with the context.
#[derive(Module, Debug)]
pub struct CqAttention<B: Backend> {
    /// Dims: [dim, 1].
    pub w_context: Param<Tensor<B, 2>>,
    /// Dims: [dim, 1].
    pub w_query: Param<Tensor<B, 2>>,
    /// Dims: [1, 1, dim].
    pub w_mul: Param<Tensor<B, 3>>,
    pub dropout: Dropout,
    /// Input channel: 4 * dim.
    /// Output channel: dim.
    pub projection: Linear<B>,
}

impl<B: Backend> CqAttention<B> {
    /// # Shapes
    ///   - context [batch, clips, dim]
    ///   - query [batch, words, dim]
    ///   - Output [batch, clips, words]
    pub fn similarity(&self, context: Tensor<B, 3>, query: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, clips, dim] = context.dims();
        let [_, words, _] = query.dims();

        let context = self.dropout.forward(context);
        let query = self.dropout.forward(query);

        let w_context = self.w_context.val().reshape([1, 1, dim]);
        let w_query = self.w_query.val().reshape([1, 1, dim]);

        let by_context = (context.clone() * w_context.expand([batch, clips, dim]))
            .sum_dim(2)
            .expand([batch, clips, words]);
        let by_query = (query.clone() * w_query.expand([batch, words, dim]))
            .sum_dim(2)
            .swap_dims(1, 2)
            .expand([batch, clips, words]);
        let joint = (context * self.w_mul.val().expand([batch, clips, dim]))
            .matmul(query.swap_dims(1, 2));

        by_context + by_query + joint
    }

    /// # Shapes
    ///   - context [batch, clips, dim]
    ///   - query [batch, words, dim]
    ///   - c_mask [batch, clips]
    ///   - q_mask [batch, words]
    ///   - Output [batch, clips, dim]
    pub fn forward(
        &self,
        context: Tensor<B, 3>,
        query: Tensor<B, 3>,
        c_mask: Tensor<B, 2, Bool>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch, clips, dim] = context.dims();
        let [_, words, _] = query.dims();

        let score = self.similarity(context.clone(), query.clone());
        let q_mask = q_mask.unsqueeze_dim::<3>(1).expand([batch, clips, words]);
        let c_mask = c_mask.unsqueeze_dim::<3>(2).expand([batch, clips, words]);

        // [batch, clips, words], normalized over words
        let by_words = softmax(mask_logits(score.clone(), q_mask), 2);
        // [batch, words, clips], normalized over clips
        let by_clips = softmax(mask_logits(score, c_mask), 1).swap_dims(1, 2);

        let c2q = by_words.clone().matmul(query);
        let q2c = by_words.matmul(by_clips).matmul(context.clone());
        debug_assert_eq!([batch, clips, dim], c2q.dims());
        debug_assert_eq!([batch, clips, dim], q2c.dims());

        let fused = Tensor::cat(
            vec![
                context.clone(),
                c2q.clone(),
                context.clone() * c2q,
                context * q2c,
            ],
            2,
        );
        self.projection.forward(fused)
    }
}
