//! Stemming strategies applied before normalization.

use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};

/// A stateless string stemmer.
///
/// The encoder hands the whole space-joined sentence to `stem`, not one word
/// at a time, so implementations see multi-word input.
pub trait Stemmer: Send + Sync {
    fn stem(&self, text: &str) -> String;
}

/// Porter (Snowball English) stemmer. Lower-cases its input first.
pub struct PorterStemmer {
    inner: SnowballStemmer,
}

impl PorterStemmer {
    pub fn new() -> Self {
        Self {
            inner: SnowballStemmer::create(Algorithm::English),
        }
    }
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.inner.stem(&lowered).into_owned()
    }
}

/// Passes text through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porter_single_words() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("Cats"), "cat");
    }

    #[test]
    fn test_porter_stems_only_the_sentence_end() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("cats and dogs"), "cats and dog");
    }

    #[test]
    fn test_identity() {
        assert_eq!(IdentityStemmer.stem("Running Cats"), "Running Cats");
    }
}
