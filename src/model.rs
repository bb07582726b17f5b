//! The teacher VSLNet: four blocks run in a fixed order.
//!
//! 1. embedding/projection of the query and the video;
//! 2. a shared feature encoder, applied to the query and then to the video;
//! 3. context-query attention, query concatenation and highlighting;
//! 4. the conditioned span predictor.
//!
//! References:
//! - https://arxiv.org/abs/2004.13931 (VSLNet)
//! - https://github.com/EGO4D/episodic-memory/tree/main/NLQ/VSLNet

use crate::embedding::*;
use crate::encoder::*;
use crate::error::{Result, VslNetError};
use crate::interaction::*;
use crate::predictor::*;
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct TeacherVslNetConfig {
    /// Dimension of the pre-extracted clip features.
    #[config(default = 2304)]
    pub video_feature_dim: usize,

    /// Hidden dimension shared by every block.
    #[config(default = 128)]
    pub dim: usize,

    #[config(default = 0.2)]
    pub drop_rate: f64,

    /// Word vocabulary size, including the padding (`0`) and unknown (`1`) ids.
    pub word_size: usize,

    /// Character vocabulary size, including the padding id `0`.
    pub char_size: usize,

    #[config(default = 300)]
    pub word_dim: usize,

    #[config(default = 50)]
    pub char_dim: usize,

    /// Must divide `dim`.
    #[config(default = 8)]
    pub num_heads: usize,

    /// Longest query or video sequence the positional embeddings cover.
    #[config(default = 128)]
    pub max_pos_len: usize,

    #[config(default = "Predictor::Rnn")]
    pub predictor: Predictor,

    /// Query conditioning of the video pass through the feature encoder.
    #[config(default = "FilmMode::Disabled")]
    pub film_mode: FilmMode,
}

impl TeacherVslNetConfig {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("video_feature_dim", self.video_feature_dim),
            ("dim", self.dim),
            ("word_size", self.word_size),
            ("char_size", self.char_size),
            ("word_dim", self.word_dim),
            ("char_dim", self.char_dim),
            ("num_heads", self.num_heads),
            ("max_pos_len", self.max_pos_len),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(VslNetError::invalid(format!("{name} must be positive")));
        }
        if self.dim % self.num_heads != 0 {
            return Err(VslNetError::HeadsNotDivisible {
                dim: self.dim,
                num_heads: self.num_heads,
            });
        }
        if !(0.0..1.0).contains(&self.drop_rate) {
            return Err(VslNetError::invalid(format!(
                "drop_rate must be in [0, 1), got {}",
                self.drop_rate
            )));
        }
        Ok(())
    }

    /// Returns the initialized model.
    ///
    /// With `word_vectors` (`[n, word_dim]`), query words are embedded with
    /// frozen pre-trained vectors instead of a trainable table.
    pub fn init<B: Backend>(
        &self,
        word_vectors: Option<Tensor<B, 2>>,
        device: &B::Device,
    ) -> Result<TeacherVslNet<B>> {
        self.validate()?;
        let pretrained = word_vectors.is_some();

        let model = TeacherVslNet {
            // block 1
            video_affine: VisualProjectionConfig::new(self.video_feature_dim, self.dim)
                .with_drop_rate(self.drop_rate)
                .init(device),
            embedding_net: QueryEmbeddingConfig::new(
                self.word_size,
                self.char_size,
                self.word_dim,
                self.char_dim,
                self.dim,
            )
            .with_drop_rate(self.drop_rate)
            .init(word_vectors, device)?,
            // block 2
            feature_encoder: FeatureEncoderConfig::new(self.dim, self.num_heads, self.max_pos_len)
                .with_kernel_size(7)
                .with_num_layers(4)
                .with_drop_rate(self.drop_rate)
                .with_film_mode(self.film_mode)
                .init(device),
            // block 3
            cq_attention: CqAttentionConfig::new(self.dim)
                .with_drop_rate(self.drop_rate)
                .init(device),
            cq_concat: CqConcatenateConfig::new(self.dim).init(device),
            highlight_layer: HighlightLayerConfig::new(self.dim).init(device),
            // block 4
            predictor: ConditionedPredictorConfig::new(self.dim, self.num_heads, self.max_pos_len)
                .with_drop_rate(self.drop_rate)
                .with_predictor(self.predictor)
                .init(device),
        };

        tracing::debug!(
            dim = self.dim,
            predictor = ?self.predictor,
            film_mode = ?self.film_mode,
            pretrained,
            params = model.num_params(),
            "initialized teacher VSLNet"
        );
        Ok(model)
    }
}

#[derive(Module, Debug)]
pub struct TeacherVslNet<B: Backend> {
    pub video_affine: VisualProjection<B>,
    pub embedding_net: QueryEmbedding<B>,
    /// Shared by the query and the video.
    pub feature_encoder: FeatureEncoder<B>,
    pub cq_attention: CqAttention<B>,
    pub cq_concat: CqConcatenate<B>,
    pub highlight_layer: HighlightLayer<B>,
    pub predictor: ConditionedPredictor<B>,
}

#[derive(Debug, Clone)]
pub struct VslNetOutput<B: Backend> {
    /// Dims: [batch, clips]. Probability that each clip lies in the moment.
    pub h_score: Tensor<B, 2>,
    /// Dims: [batch, clips].
    pub start_logits: Tensor<B, 2>,
    /// Dims: [batch, clips].
    pub end_logits: Tensor<B, 2>,
}

impl<B: Backend> TeacherVslNet<B> {
    /// # Shapes
    ///   - word_ids [batch, words]
    ///   - char_ids [batch, words, chars]
    ///   - video_features [batch, clips, video_feature_dim]
    ///   - v_mask [batch, clips]
    ///   - q_mask [batch, words]
    ///   - Output: each field [batch, clips]
    pub fn forward(
        &self,
        word_ids: Tensor<B, 2, Int>,
        char_ids: Tensor<B, 3, Int>,
        video_features: Tensor<B, 3>,
        v_mask: Tensor<B, 2, Bool>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> VslNetOutput<B> {
        let [batch, clips, _] = video_features.dims();
        let [_, words] = word_ids.dims();
        debug_assert_eq!([batch, clips], v_mask.dims());
        debug_assert_eq!([batch, words], q_mask.dims());

        // block 1
        let video = self.video_affine.forward(video_features);
        let query = self.embedding_net.forward(word_ids, char_ids);
        let [_, _, dim] = video.dims();
        debug_assert_eq!([batch, words, dim], query.dims());

        // block 2
        let query = self.feature_encoder.forward(query, q_mask.clone());
        let video = self.feature_encoder.forward_conditioned(
            video,
            v_mask.clone(),
            query.clone(),
            q_mask.clone(),
        );

        // block 3
        let features =
            self.cq_attention
                .forward(video, query.clone(), v_mask.clone(), q_mask.clone());
        let features = self.cq_concat.forward(features, query, q_mask);
        let h_score = self.highlight_layer.forward(features.clone(), v_mask.clone());
        let features = features
            * h_score
                .clone()
                .reshape([batch, clips, 1])
                .expand([batch, clips, dim]);

        // block 4
        let (start_logits, end_logits) = self.predictor.forward(features, v_mask);

        VslNetOutput {
            h_score,
            start_logits,
            end_logits,
        }
    }

    /// See [ConditionedPredictor::extract_index].
    pub fn extract_index(
        &self,
        start_logits: Tensor<B, 2>,
        end_logits: Tensor<B, 2>,
    ) -> (Tensor<B, 1, Int>, Tensor<B, 1, Int>) {
        ConditionedPredictor::extract_index(start_logits, end_logits)
    }

    /// See [HighlightLayer::compute_loss].
    pub fn compute_highlight_loss(
        &self,
        scores: Tensor<B, 2>,
        labels: Tensor<B, 2>,
        mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 1> {
        self.highlight_layer.compute_loss(scores, labels, mask)
    }

    /// See [ConditionedPredictor::compute_cross_entropy_loss].
    pub fn compute_loss(
        &self,
        start_logits: Tensor<B, 2>,
        end_logits: Tensor<B, 2>,
        start_labels: Tensor<B, 1, Int>,
        end_labels: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        ConditionedPredictor::compute_cross_entropy_loss(
            start_logits,
            end_logits,
            start_labels,
            end_labels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TeacherVslNetConfig::new(1000, 60).validate().unwrap();
    }

    #[test]
    fn heads_must_divide_dim() {
        let err = TeacherVslNetConfig::new(1000, 60)
            .with_dim(100)
            .with_num_heads(8)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            VslNetError::HeadsNotDivisible {
                dim: 100,
                num_heads: 8
            }
        ));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let err = TeacherVslNetConfig::new(0, 60).validate().unwrap_err();
        assert!(err.to_string().contains("word_size"));
    }

    #[test]
    fn drop_rate_must_be_a_probability() {
        let err = TeacherVslNetConfig::new(1000, 60)
            .with_drop_rate(1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, VslNetError::InvalidParameter { .. }));
    }
}
