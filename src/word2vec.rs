//! Pretrained word-vector tables in word2vec format.

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const MAX_PREALLOC_WORDS: usize = 1 << 16;
const MAX_PREALLOC_VALUES: usize = 1 << 22;

/// Read-only token to vector lookup.
pub trait WordVectors {
    /// Vector width.
    fn dim(&self) -> usize;

    fn vector(&self, token: &str) -> Option<ArrayView1<'_, f32>>;
}

/// Word vectors loaded from a word2vec file.
///
/// Vectors are stored as rows of one `[vocab, dim]` matrix.
#[derive(Debug, Clone)]
pub struct KeyedVectors {
    index: HashMap<String, usize>,
    vectors: Array2<f32>,
}

impl KeyedVectors {
    /// Load a word2vec file, binary (`.bin`) or text.
    pub fn load(path: &Path, binary: bool) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open word vectors {:?}", path))?;
        let reader = BufReader::new(file);

        let vectors = if binary {
            Self::read_binary(reader)
        } else {
            Self::read_text(reader)
        }
        .with_context(|| format!("Failed to read word vectors {:?}", path))?;

        tracing::debug!(
            words = vectors.len(),
            dim = vectors.dim(),
            "loaded word vectors from {:?}",
            path
        );
        Ok(vectors)
    }

    /// Binary layout: a `"<count> <dim>\n"` header, then per word the UTF-8
    /// word, one space and `dim` little-endian `f32` values.
    pub fn read_binary<R: BufRead>(mut reader: R) -> Result<Self> {
        let (count, dim) = read_header(&mut reader)?;

        let (mut words, mut data) = preallocate(count, dim);
        let mut raw = [0u8; 4];
        let mut word = Vec::new();

        for entry in 0..count {
            word.clear();
            reader
                .read_until(b' ', &mut word)
                .with_context(|| format!("Failed to read word {}", entry))?;
            if word.last() != Some(&b' ') {
                anyhow::bail!("Unexpected end of file at word {} of {}", entry, count);
            }
            word.pop();

            for _ in 0..dim {
                reader
                    .read_exact(&mut raw)
                    .with_context(|| format!("Failed to read vector {}", entry))?;
                data.push(f32::from_le_bytes(raw));
            }

            // Some writers end each record with a newline, others start the next word with one.
            let token = String::from_utf8_lossy(&word).trim_start().to_string();
            words.push(token);
        }

        Self::from_parts(words, data, dim)
    }

    /// Text layout: a `"<count> <dim>"` header, then one `word v1 v2 ...` line per word.
    pub fn read_text<R: BufRead>(mut reader: R) -> Result<Self> {
        let (count, dim) = read_header(&mut reader)?;

        let (mut words, mut data) = preallocate(count, dim);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line")?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            let before = data.len();
            for field in fields {
                let value: f32 = field.parse().with_context(|| {
                    format!("Invalid value {:?} on line {}", field, line_no + 2)
                })?;
                data.push(value);
            }
            if data.len() - before != dim {
                anyhow::bail!(
                    "Line {} has {} values, expected {}",
                    line_no + 2,
                    data.len() - before,
                    dim
                );
            }
            words.push(word.to_string());
        }

        if words.len() != count {
            anyhow::bail!("Header declares {} words, found {}", count, words.len());
        }

        Self::from_parts(words, data, dim)
    }

    fn from_parts(words: Vec<String>, data: Vec<f32>, dim: usize) -> Result<Self> {
        let vectors = Array2::from_shape_vec((words.len(), dim), data)
            .context("Failed to shape word vector matrix")?;
        // Later duplicates win, matching a plain map insert.
        let index = words
            .into_iter()
            .enumerate()
            .map(|(row, word)| (word, row))
            .collect();
        Ok(Self { index, vectors })
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl WordVectors for KeyedVectors {
    fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    fn vector(&self, token: &str) -> Option<ArrayView1<'_, f32>> {
        self.index.get(token).map(|&row| self.vectors.row(row))
    }
}

/// In-memory tables, mostly for tests. The width is taken from any entry.
impl WordVectors for HashMap<String, Vec<f32>> {
    fn dim(&self) -> usize {
        self.values().next().map_or(0, Vec::len)
    }

    fn vector(&self, token: &str) -> Option<ArrayView1<'_, f32>> {
        self.get(token).map(|values| ArrayView1::from(values.as_slice()))
    }
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize)> {
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .context("Failed to read header")?;

    let mut fields = header.split_whitespace().map(str::parse::<usize>);
    match (fields.next(), fields.next()) {
        (Some(Ok(count)), Some(Ok(dim))) => {
            count
                .checked_mul(dim)
                .and_then(|values| values.checked_mul(std::mem::size_of::<f32>()))
                .with_context(|| {
                    format!("word2vec header {}x{} is too large", count, dim)
                })?;
            Ok((count, dim))
        }
        _ => anyhow::bail!("Invalid word2vec header {:?}", header.trim_end()),
    }
}

/// Buffers sized from the header, capped so a bad header cannot force a huge allocation.
fn preallocate(count: usize, dim: usize) -> (Vec<String>, Vec<f32>) {
    let words = count.min(MAX_PREALLOC_WORDS);
    (
        Vec::with_capacity(words),
        Vec::with_capacity(words.saturating_mul(dim).min(MAX_PREALLOC_VALUES)),
    )
}
