mod attention;
mod conv_block;
mod feature_encoder;
mod film;
mod positional;

pub use attention::{MultiHeadAttentionBlock, MultiHeadAttentionBlockConfig};
pub use conv_block::{
    DepthwiseSeparableConv, DepthwiseSeparableConvBlock, DepthwiseSeparableConvBlockConfig,
};
pub use feature_encoder::{FeatureEncoder, FeatureEncoderConfig};
pub use film::{FilmGenerator, FilmGeneratorConfig, FilmMode};
pub use positional::{PositionalEmbedding, PositionalEmbeddingConfig};
