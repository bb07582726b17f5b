mod conditioned;
mod dynamic_rnn;

pub use conditioned::{
    ConditionedPredictor, ConditionedPredictorConfig, SpanEncoder, SpanHead, TransformerSpanEncoder,
    RnnSpanEncoder,
};
pub use dynamic_rnn::{DynamicRnn, DynamicRnnConfig};

/// Sequence encoder feeding the start/end heads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predictor {
    /// Two chained LSTMs, one for the start and one for the end.
    #[default]
    Rnn,
    /// One shared feature encoder applied twice.
    Transformer,
}
