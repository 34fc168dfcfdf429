//! Embedding matrix initialization from pretrained word vectors.

use ndarray::Array2;
use rand::Rng;

use crate::constants::{EMBEDDING_DIM, PAD_TOKEN, UNK_ID, UNK_INIT_RANGE, UNK_TOKEN};
use crate::error::{PrepError, PrepResult};
use crate::vocab::Vocabulary;
use crate::word2vec::WordVectors;

/// Builds the `[rows, dim]` initial weights for a model's embedding layer.
///
/// Rows follow ascending vocabulary id:
/// - `<unk>` gets a uniform random vector in `[-UNK_INIT_RANGE, UNK_INIT_RANGE)`,
///   sampled once per build.
/// - `<pad>` gets a zero vector.
/// - any other token with the unknown id is left out.
/// - every remaining token is copied from the pretrained table, and a missing
///   entry aborts the build.
pub struct EmbeddingMatrixBuilder<'a> {
    vocab: &'a Vocabulary,
    dim: usize,
}

impl<'a> EmbeddingMatrixBuilder<'a> {
    pub fn new(vocab: &'a Vocabulary) -> Self {
        Self {
            vocab,
            dim: EMBEDDING_DIM,
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn build<V: WordVectors + ?Sized>(&self, vectors: &V) -> PrepResult<Array2<f32>> {
        self.build_with_rng(vectors, &mut rand::thread_rng())
    }

    pub fn build_with_rng<V, R>(&self, vectors: &V, rng: &mut R) -> PrepResult<Array2<f32>>
    where
        V: WordVectors + ?Sized,
        R: Rng + ?Sized,
    {
        let unknown: Vec<f32> = (0..self.dim)
            .map(|_| rng.gen_range(-UNK_INIT_RANGE..UNK_INIT_RANGE))
            .collect();

        let mut data = Vec::with_capacity(self.vocab.len() * self.dim);
        let mut rows = 0usize;

        for (token, id) in self.vocab.iter_by_id() {
            if token == UNK_TOKEN {
                data.extend_from_slice(&unknown);
            } else if token == PAD_TOKEN {
                data.extend(std::iter::repeat(0.0f32).take(self.dim));
            } else if id == UNK_ID {
                tracing::warn!(token, "token shares the unknown id and gets no embedding row");
                continue;
            } else {
                let vector = vectors.vector(token).ok_or_else(|| PrepError::MissingVector {
                    token: token.to_string(),
                })?;
                if vector.len() != self.dim {
                    return Err(PrepError::DimensionMismatch {
                        token: token.to_string(),
                        expected: self.dim,
                        actual: vector.len(),
                    });
                }
                data.extend(vector.iter().copied());
            }
            rows += 1;
        }

        // `None` when the largest id is negative and no row count can match it.
        let expected_rows = match self.vocab.max_id() {
            None => Some(0),
            Some(max) => usize::try_from(max).ok().and_then(|max| max.checked_add(1)),
        };
        if expected_rows != Some(rows) {
            tracing::warn!(
                rows,
                ?expected_rows,
                "embedding rows do not line up with vocabulary ids"
            );
        }

        Ok(Array2::from_shape_vec((rows, self.dim), data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    const DIM: usize = 4;

    fn table(tokens: &[&str]) -> HashMap<String, Vec<f32>> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.to_string(), vec![i as f32 + 1.0; DIM]))
            .collect()
    }

    fn builder(vocab: &Vocabulary) -> EmbeddingMatrixBuilder<'_> {
        EmbeddingMatrixBuilder::new(vocab).with_dim(DIM)
    }

    #[test]
    fn test_default_dim() {
        let vocab = Vocabulary::default();
        assert_eq!(EmbeddingMatrixBuilder::new(&vocab).dim(), EMBEDDING_DIM);
    }

    #[test]
    fn test_special_rows() {
        let vocab: Vocabulary = [("<unk>", 0), ("<pad>", 1), ("how", 2)].into_iter().collect();
        let vectors = table(&["how"]);

        let matrix = builder(&vocab).build(&vectors).unwrap();

        assert_eq!(matrix.shape(), &[3, DIM]);
        assert!(matrix.row(0).iter().all(|&v| (-0.05..0.05).contains(&v)));
        assert!(matrix.row(1).iter().all(|&v| v == 0.0));
        assert_eq!(matrix.row(2).to_vec(), vec![1.0; DIM]);
    }

    #[test]
    fn test_full_width_unknown_row() {
        let vocab: Vocabulary = [("<unk>", 0), ("<pad>", 1)].into_iter().collect();
        let vectors: HashMap<String, Vec<f32>> = HashMap::new();

        let matrix = EmbeddingMatrixBuilder::new(&vocab).build(&vectors).unwrap();

        assert_eq!(matrix.shape(), &[2, EMBEDDING_DIM]);
        assert!(matrix.row(0).iter().all(|&v| (-0.05..0.05).contains(&v)));
        assert!(matrix.row(0).iter().any(|&v| v != 0.0));
        assert!(matrix.row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_seeded_builds_repeat() {
        let vocab: Vocabulary = [("<unk>", 0), ("<pad>", 1)].into_iter().collect();
        let vectors = table(&[]);

        let a = builder(&vocab)
            .build_with_rng(&vectors, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = builder(&vocab)
            .build_with_rng(&vectors, &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_id_collision_is_dropped() {
        let vocab: Vocabulary = [("<unk>", 0), ("<pad>", 1), ("stray", 0), ("how", 2)]
            .into_iter()
            .collect();
        let vectors = table(&["stray", "how"]);

        let matrix = builder(&vocab).build(&vectors).unwrap();

        assert_eq!(matrix.nrows(), vocab.len() - 1);
        assert_eq!(matrix.row(2).to_vec(), vec![2.0; DIM]);
    }

    #[test]
    fn test_rows_follow_ids_not_insertion_order() {
        let vocab: Vocabulary = [("do", 3), ("<pad>", 1), ("how", 2), ("<unk>", 0)]
            .into_iter()
            .collect();
        let vectors = table(&["how", "do"]);

        let matrix = builder(&vocab).build(&vectors).unwrap();

        assert_eq!(matrix.nrows(), 4);
        assert!(matrix.row(1).iter().all(|&v| v == 0.0));
        assert_eq!(matrix.row(2).to_vec(), vec![1.0; DIM]);
        assert_eq!(matrix.row(3).to_vec(), vec![2.0; DIM]);
    }

    #[test]
    fn test_negative_ids_do_not_overflow_row_check() {
        let vocab: Vocabulary = [("<unk>", -1)].into_iter().collect();
        let matrix = builder(&vocab).build(&table(&[])).unwrap();
        assert_eq!(matrix.shape(), &[1, DIM]);
    }

    #[test]
    fn test_missing_vector_names_token() {
        let vocab: Vocabulary = [("<unk>", 0), ("<pad>", 1), ("rare", 2)].into_iter().collect();
        let err = builder(&vocab).build(&table(&[])).unwrap_err();
        match err {
            PrepError::MissingVector { token } => assert_eq!(token, "rare"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let vocab: Vocabulary = [("<unk>", 0), ("how", 1)].into_iter().collect();
        let mut vectors = HashMap::new();
        vectors.insert("how".to_string(), vec![0.0f32; DIM + 1]);

        let err = builder(&vocab).build(&vectors).unwrap_err();
        assert!(matches!(err, PrepError::DimensionMismatch { expected: DIM, actual: 5, .. }));
    }
}
