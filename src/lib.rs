//! Query Classifier Data Preparation Library
//!
//! Normalizes free-text queries, encodes them against a fixed vocabulary and
//! assembles padded id tensors with class labels, plus the pretrained
//! embedding matrix that matches the vocabulary.

pub mod batch;
pub mod corpus;
pub mod embedding;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod stem;
pub mod vocab;
pub mod word2vec;

pub use batch::{pad_sequences, BatchAssembler, BatchTensors};
pub use corpus::{CorpusSummary, LabelNames, LabeledCorpus};
pub use embedding::EmbeddingMatrixBuilder;
pub use encode::SequenceEncoder;
pub use error::{PrepError, PrepResult};
pub use normalize::{normalize, TextNormalizer};
pub use stem::{IdentityStemmer, PorterStemmer, Stemmer};
pub use vocab::Vocabulary;
pub use word2vec::{KeyedVectors, WordVectors};

/// Layout constants shared with the model that consumes these tensors.
pub mod constants {
    /// Width of the pretrained word vectors.
    pub const EMBEDDING_DIM: usize = 300;
    pub const PAD_TOKEN: &str = "<pad>";
    pub const UNK_TOKEN: &str = "<unk>";
    /// Id every out-of-vocabulary token maps to.
    pub const UNK_ID: i64 = 0;
    /// Pad fill used when the vocabulary has no `<pad>` entry.
    pub const DEFAULT_PAD_FILL: i64 = 1;
    /// Half-width of the uniform range for the `<unk>` embedding row.
    pub const UNK_INIT_RANGE: f32 = 0.05;
}
