//! Sentence to token-id encoding.

use crate::normalize::TextNormalizer;
use crate::stem::{PorterStemmer, Stemmer};
use crate::vocab::Vocabulary;

/// Turns tokenized sentences into vocabulary ids.
///
/// The words of a sentence are joined with single spaces and the stemmer runs
/// once over the joined string, then the normalizer. Tokens missing from the
/// vocabulary map to the unknown id `0`.
pub struct SequenceEncoder<'a> {
    vocab: &'a Vocabulary,
    stemmer: Box<dyn Stemmer>,
    normalizer: &'static TextNormalizer,
}

impl<'a> SequenceEncoder<'a> {
    /// Encoder with the default Porter stemmer.
    pub fn new(vocab: &'a Vocabulary) -> Self {
        Self::with_stemmer(vocab, Box::new(PorterStemmer::new()))
    }

    pub fn with_stemmer(vocab: &'a Vocabulary, stemmer: Box<dyn Stemmer>) -> Self {
        Self {
            vocab,
            stemmer,
            normalizer: TextNormalizer::shared(),
        }
    }

    pub fn vocab(&self) -> &'a Vocabulary {
        self.vocab
    }

    pub fn word_id(&self, word: &str) -> i64 {
        self.vocab.id(word)
    }

    /// Normalized tokens for `words`, before vocabulary lookup.
    pub fn tokens<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        if words.is_empty() {
            return Vec::new();
        }

        let joined = words
            .iter()
            .map(|word| word.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        let stemmed = self.stemmer.stem(&joined);

        self.normalizer
            .normalize(&stemmed)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Encode one sentence to ids.
    pub fn encode<S: AsRef<str>>(&self, words: &[S]) -> Vec<i64> {
        self.tokens(words)
            .iter()
            .map(|token| self.word_id(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stem::IdentityStemmer;

    fn vocab() -> Vocabulary {
        [
            ("<unk>", 0),
            ("<pad>", 1),
            ("how", 2),
            ("do", 3),
            ("i", 4),
            ("run", 5),
            ("not", 6),
            ("5000", 7),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_empty_input() {
        let vocab = vocab();
        let encoder = SequenceEncoder::new(&vocab);
        let words: [&str; 0] = [];
        assert!(encoder.encode(&words).is_empty());
    }

    #[test]
    fn test_unknown_word_maps_to_zero() {
        let vocab = vocab();
        let encoder = SequenceEncoder::new(&vocab);
        assert_eq!(encoder.encode(&["unseenword123xyz"]), vec![0]);
    }

    #[test]
    fn test_stem_runs_on_joined_sentence() {
        let vocab = vocab();
        let encoder = SequenceEncoder::new(&vocab);
        // Only the final word of the joined string is stemmed.
        assert_eq!(encoder.tokens(&["how", "do", "i", "running"]), ["how", "do", "i", "run"]);
        assert_eq!(encoder.encode(&["How", "do", "I", "running"]), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_normalization_splits_tokens() {
        let vocab = vocab();
        let encoder = SequenceEncoder::with_stemmer(&vocab, Box::new(IdentityStemmer));
        assert_eq!(encoder.encode(&["i", "don't", "5k"]), vec![4, 3, 6, 7]);
    }
}
