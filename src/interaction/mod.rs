mod cq_attention;
mod cq_concat;
mod highlight;
mod weighted_pool;

pub use cq_attention::{CqAttention, CqAttentionConfig};
pub use cq_concat::{CqConcatenate, CqConcatenateConfig};
pub use highlight::{HighlightLayer, HighlightLayerConfig};
pub use weighted_pool::{WeightedPool, WeightedPoolConfig};
