mod character;
mod query;
mod visual;
mod word;

pub use character::{CHAR_CHANNELS, CHAR_KERNELS, CharacterEmbedding, CharacterEmbeddingConfig};
pub use query::{QueryEmbedding, QueryEmbeddingConfig};
pub use visual::{VisualProjection, VisualProjectionConfig};
pub use word::{PAD_ID, PretrainedWords, WordEmbedding, WordEmbeddingConfig, WordTable};
