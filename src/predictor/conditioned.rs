use crate::encoder::{FeatureEncoder, FeatureEncoderConfig};
use crate::predictor::{DynamicRnn, DynamicRnnConfig, Predictor};
use crate::utils::init::linear;
use crate::utils::mask_logits;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::nn::{LayerNorm, LayerNormConfig, Linear, Relu};
use burn::prelude::*;
use burn::tensor::activation::softmax;

#[derive(Config, Debug)]
pub struct ConditionedPredictorConfig {
    pub dim: usize,
    /// Used by [Predictor::Transformer] only.
    pub num_heads: usize,
    /// Used by [Predictor::Transformer] only.
    pub max_pos_len: usize,
    #[config(default = 0.0)]
    pub drop_rate: f64,
    #[config(default = "Predictor::Rnn")]
    pub predictor: Predictor,
}

impl ConditionedPredictorConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConditionedPredictor<B> {
        let encoder = match self.predictor {
            Predictor::Rnn => SpanEncoder::Rnn(RnnSpanEncoder {
                start: DynamicRnnConfig::new(self.dim).init(device),
                end: DynamicRnnConfig::new(self.dim).init(device),
            }),
            Predictor::Transformer => {
                let norm = || {
                    LayerNormConfig::new(self.dim)
                        .with_epsilon(1e-6)
                        .init(device)
                };
                SpanEncoder::Transformer(TransformerSpanEncoder {
                    encoder: FeatureEncoderConfig::new(self.dim, self.num_heads, self.max_pos_len)
                        .with_kernel_size(7)
                        .with_num_layers(4)
                        .with_drop_rate(self.drop_rate)
                        .init(device),
                    start_norm: norm(),
                    end_norm: norm(),
                })
            }
        };
        let head = || SpanHead {
            hidden: linear(2 * self.dim, self.dim, true, device),
            activation: Relu::new(),
            output: linear(self.dim, 1, true, device),
        };

        ConditionedPredictor {
            encoder,
            start_head: head(),
            end_head: head(),
        }
    }
}

#[derive(Module, Debug)]
pub enum SpanEncoder<B: Backend> {
    Rnn(RnnSpanEncoder<B>),
    Transformer(TransformerSpanEncoder<B>),
}

#[derive(Module, Debug)]
pub struct RnnSpanEncoder<B: Backend> {
    pub start: DynamicRnn<B>,
    pub end: DynamicRnn<B>,
}

#[derive(Module, Debug)]
pub struct TransformerSpanEncoder<B: Backend> {
    /// Applied twice: once for the start features, once more for the end.
    pub encoder: FeatureEncoder<B>,
    pub start_norm: LayerNorm<B>,
    pub end_norm: LayerNorm<B>,
}

/// Two-layer scorer over `[features, x]`.
#[derive(Module, Debug)]
pub struct SpanHead<B: Backend> {
    /// Input channel: 2 * dim.
    /// Output channel: dim.
    pub hidden: Linear<B>,
    pub activation: Relu,
    /// Input channel: dim.
    /// Output channel: 1.
    pub output: Linear<B>,
}

impl<B: Backend> SpanHead<B> {
    /// # Shapes
    ///   - features [batch, clips, dim]
    ///   - x [batch, clips, dim]
    ///   - Output [batch, clips]
    pub fn forward(&self, features: Tensor<B, 3>, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, clips, _dim] = x.dims();
        let y = self.hidden.forward(Tensor::cat(vec![features, x], 2));
        let y = self.output.forward(self.activation.forward(y));
        y.reshape([batch, clips])
    }
}

/// Predicts start and end logits, the end being conditioned on the start
/// features.
#[derive(Module, Debug)]
pub struct ConditionedPredictor<B: Backend> {
    pub encoder: SpanEncoder<B>,
    pub start_head: SpanHead<B>,
    pub end_head: SpanHead<B>,
}

impl<B: Backend> ConditionedPredictor<B> {
    /// Masked clips get a huge negative logit.
    ///
    /// # Shapes
    ///   - x [batch, clips, dim]
    ///   - mask [batch, clips]
    ///   - Output ([batch, clips], [batch, clips])
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, clips, dim] = x.dims();

        let (start, end) = match &self.encoder {
            SpanEncoder::Rnn(rnn) => {
                let start = rnn.start.forward(x.clone(), mask.clone());
                let end = rnn.end.forward(start.clone(), mask.clone());
                (start, end)
            }
            SpanEncoder::Transformer(transformer) => {
                let start = transformer.encoder.forward(x.clone(), mask.clone());
                let end = transformer.encoder.forward(start.clone(), mask.clone());
                (
                    transformer.start_norm.forward(start),
                    transformer.end_norm.forward(end),
                )
            }
        };
        debug_assert_eq!([batch, clips, dim], start.dims());
        debug_assert_eq!([batch, clips, dim], end.dims());

        let start_logits = self.start_head.forward(start, x.clone());
        let end_logits = self.end_head.forward(end, x);

        (
            mask_logits(start_logits, mask.clone()),
            mask_logits(end_logits, mask),
        )
    }

    /// Most probable span with `start <= end`.
    ///
    /// Builds the joint probability `P[i, j] = p_start[i] * p_end[j]` restricted
    /// to `j >= i`, then returns the row and column holding the maximum.
    ///
    /// # Shapes
    ///   - start_logits [batch, clips]
    ///   - end_logits [batch, clips]
    ///   - Output ([batch], [batch])
    pub fn extract_index(
        start_logits: Tensor<B, 2>,
        end_logits: Tensor<B, 2>,
    ) -> (Tensor<B, 1, Int>, Tensor<B, 1, Int>) {
        let [batch, clips] = start_logits.dims();

        let start_prob = softmax(start_logits, 1).reshape([batch, clips, 1]);
        let end_prob = softmax(end_logits, 1).reshape([batch, 1, clips]);
        let joint = start_prob.matmul(end_prob).triu(0);
        debug_assert_eq!([batch, clips, clips], joint.dims());

        let start_index = joint
            .clone()
            .max_dim(2)
            .reshape([batch, clips])
            .argmax(1)
            .reshape([batch]);
        let end_index = joint
            .max_dim(1)
            .reshape([batch, clips])
            .argmax(1)
            .reshape([batch]);

        (start_index, end_index)
    }

    /// Sum of the mean cross-entropy of the start and of the end logits.
    ///
    /// # Shapes
    ///   - start_logits [batch, clips]
    ///   - end_logits [batch, clips]
    ///   - start_labels [batch]
    ///   - end_labels [batch]
    ///   - Output [1]
    pub fn compute_cross_entropy_loss(
        start_logits: Tensor<B, 2>,
        end_logits: Tensor<B, 2>,
        start_labels: Tensor<B, 1, Int>,
        end_labels: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let loss = CrossEntropyLossConfig::new().init(&start_logits.device());
        let start_loss = loss.forward(start_logits, start_labels);
        let end_loss = loss.forward(end_logits, end_labels);
        start_loss + end_loss
    }
}
