//! Padded batch assembly for labeled corpora.

use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::Path;

use crate::constants::DEFAULT_PAD_FILL;
use crate::corpus::LabeledCorpus;
use crate::encode::SequenceEncoder;
use crate::error::{PrepError, PrepResult};

/// Input ids and class labels for a whole corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTensors {
    /// `[N, L]` token ids, right-padded with the pad fill.
    pub inputs: Array2<i64>,
    /// `[N]` class index per row.
    pub labels: Array1<i64>,
}

impl BatchTensors {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Padded sequence length.
    pub fn seq_len(&self) -> usize {
        self.inputs.ncols()
    }

    /// Save as an `.npz` archive holding `inputs.npy` and `labels.npy`.
    pub fn save_npz(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create tensor archive {:?}", path))?;
        let mut npz = NpzWriter::new(file);
        npz.add_array("inputs.npy", &self.inputs)
            .context("Failed to write inputs array")?;
        npz.add_array("labels.npy", &self.labels)
            .context("Failed to write labels array")?;
        npz.finish().context("Failed to finalize tensor archive")?;
        Ok(())
    }
}

/// Pad id sequences to the longest one.
///
/// Returns a `[sequences.len(), max_len]` array where positions past the end
/// of each sequence hold `pad_fill`.
pub fn pad_sequences(sequences: &[Vec<i64>], pad_fill: i64) -> Array2<i64> {
    let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);

    let mut padded = Array2::<i64>::from_elem((sequences.len(), max_len), pad_fill);
    for (row, sequence) in sequences.iter().enumerate() {
        for (col, &id) in sequence.iter().enumerate() {
            padded[[row, col]] = id;
        }
    }

    padded
}

/// Encodes every example of a corpus and stacks them into one padded batch.
///
/// Rows are grouped by label in ascending class order, examples keep their
/// corpus order within a class, and nothing is shuffled.
pub struct BatchAssembler<'a> {
    encoder: SequenceEncoder<'a>,
    pad_fill: i64,
}

impl<'a> BatchAssembler<'a> {
    /// Assembler padding with the vocabulary's `<pad>` id, or
    /// [`DEFAULT_PAD_FILL`] when the vocabulary has none.
    pub fn new(encoder: SequenceEncoder<'a>) -> Self {
        let pad_fill = encoder.vocab().pad_id().unwrap_or(DEFAULT_PAD_FILL);
        Self { encoder, pad_fill }
    }

    pub fn with_pad_fill(mut self, pad_fill: i64) -> Self {
        self.pad_fill = pad_fill;
        self
    }

    pub fn pad_fill(&self) -> i64 {
        self.pad_fill
    }

    pub fn assemble(&self, corpus: &LabeledCorpus) -> PrepResult<BatchTensors> {
        let classes = corpus.ordered_classes()?;

        let mut sequences = Vec::with_capacity(corpus.example_count());
        let mut labels = Vec::with_capacity(corpus.example_count());
        for (index, examples) in classes {
            for example in examples {
                sequences.push(self.encoder.encode(example));
                labels.push(index as i64);
            }
        }

        if sequences.is_empty() {
            return Err(PrepError::EmptyCorpus);
        }

        let inputs = pad_sequences(&sequences, self.pad_fill);
        let unknown = inputs.iter().filter(|&&id| id == 0).count();
        tracing::debug!(
            rows = inputs.nrows(),
            seq_len = inputs.ncols(),
            unknown,
            pad_fill = self.pad_fill,
            "assembled batch"
        );

        Ok(BatchTensors {
            inputs,
            labels: Array1::from_vec(labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stem::IdentityStemmer;
    use crate::vocab::Vocabulary;
    use ndarray::array;

    fn vocab() -> Vocabulary {
        [("<unk>", 0), ("<pad>", 1), ("a", 2), ("b", 3), ("c", 4)]
            .into_iter()
            .collect()
    }

    fn assembler(vocab: &Vocabulary) -> BatchAssembler<'_> {
        BatchAssembler::new(SequenceEncoder::with_stemmer(vocab, Box::new(IdentityStemmer)))
    }

    #[test]
    fn test_pad_sequences() {
        let padded = pad_sequences(&[vec![5, 6, 7], vec![8]], 1);
        assert_eq!(padded, array![[5, 6, 7], [8, 1, 1]]);
    }

    #[test]
    fn test_assemble_pads_with_fill_one() {
        let vocab = vocab();
        let mut corpus = LabeledCorpus::new();
        corpus.push("0", vec!["a", "b"]);
        corpus.push("1", vec!["c"]);

        let batch = assembler(&vocab).assemble(&corpus).unwrap();

        assert_eq!(batch.inputs.shape(), &[2, 2]);
        assert_eq!(batch.inputs, array![[2, 3], [4, 1]]);
        assert_eq!(batch.labels, array![0, 1]);
        assert_eq!(batch.seq_len(), 2);
    }

    #[test]
    fn test_rows_grouped_by_label_in_corpus_order() {
        let vocab = vocab();
        let mut corpus = LabeledCorpus::new();
        corpus.push("1", vec!["c"]);
        corpus.push("0", vec!["b"]);
        corpus.push("1", vec!["a", "zzz"]);
        corpus.push("0", vec!["a"]);

        let batch = assembler(&vocab).assemble(&corpus).unwrap();

        assert_eq!(batch.labels, array![0, 0, 1, 1]);
        assert_eq!(batch.inputs, array![[3, 1], [2, 1], [4, 1], [2, 0]]);
    }

    #[test]
    fn test_pad_fill_follows_vocab_pad_id() {
        let vocab: Vocabulary = [("<unk>", 0), ("a", 1), ("<pad>", 9)].into_iter().collect();
        let mut corpus = LabeledCorpus::new();
        corpus.push("0", vec!["a", "a"]);
        corpus.push("0", vec!["a"]);

        let batch = assembler(&vocab).assemble(&corpus).unwrap();
        assert_eq!(batch.inputs, array![[1, 1], [1, 9]]);

        let batch = assembler(&vocab).with_pad_fill(-1).assemble(&corpus).unwrap();
        assert_eq!(batch.inputs, array![[1, 1], [1, -1]]);
    }

    #[test]
    fn test_default_pad_fill_without_pad_token() {
        let vocab: Vocabulary = [("<unk>", 0), ("a", 2)].into_iter().collect();
        assert_eq!(assembler(&vocab).pad_fill(), DEFAULT_PAD_FILL);
    }

    #[test]
    fn test_empty_corpus() {
        let vocab = vocab();
        let err = assembler(&vocab).assemble(&LabeledCorpus::new()).unwrap_err();
        assert!(matches!(err, PrepError::EmptyCorpus));
    }

    #[test]
    fn test_classes_without_examples_are_empty() {
        let vocab = vocab();
        let corpus: LabeledCorpus = serde_json::from_str(r#"{"0": [], "1": []}"#).unwrap();
        let err = assembler(&vocab).assemble(&corpus).unwrap_err();
        assert!(matches!(err, PrepError::EmptyCorpus));
    }

    #[test]
    fn test_malformed_label() {
        let vocab = vocab();
        let mut corpus = LabeledCorpus::new();
        corpus.push("x", vec!["a"]);
        let err = assembler(&vocab).assemble(&corpus).unwrap_err();
        assert!(matches!(err, PrepError::MalformedLabel { .. }));
    }
}
