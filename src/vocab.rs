//! Vocabulary loading and token lookup.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::constants::{PAD_TOKEN, UNK_ID, UNK_TOKEN};

/// Vocabulary mapping from tokens to ids.
///
/// Keeps the insertion (file) order of its entries. Id `0` is the unknown id:
/// every lookup miss resolves to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    map: IndexMap<String, i64>,
}

impl Vocabulary {
    /// Load vocabulary from a JSON file.
    ///
    /// The JSON file should be a flat object mapping tokens to ids:
    /// ```json
    /// { "<unk>": 0, "<pad>": 1, "how": 2, ... }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open vocab file {:?}", path))?;
        let reader = BufReader::new(file);
        let vocab: Vocabulary =
            serde_json::from_reader(reader).context("Failed to parse vocab JSON")?;

        if let Some((token, id)) = vocab.map.iter().find(|&(_, &id)| id < 0) {
            anyhow::bail!("Invalid vocab id {} for token {:?}", id, token);
        }

        tracing::debug!(entries = vocab.len(), "loaded vocabulary from {:?}", path);
        Ok(vocab)
    }

    /// Add or replace a token. Returns the previous id, if any.
    pub fn insert(&mut self, token: impl Into<String>, id: i64) -> Option<i64> {
        self.map.insert(token.into(), id)
    }

    /// Id of `token`, if present.
    pub fn get(&self, token: &str) -> Option<i64> {
        self.map.get(token).copied()
    }

    /// Id of `token`, falling back to the unknown id.
    pub fn id(&self, token: &str) -> i64 {
        self.get(token).unwrap_or(UNK_ID)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.map.contains_key(token)
    }

    /// Id of the `<pad>` token, if the vocabulary has one.
    pub fn pad_id(&self) -> Option<i64> {
        self.get(PAD_TOKEN)
    }

    /// Id of the `<unk>` token, if the vocabulary has one.
    pub fn unk_id(&self) -> Option<i64> {
        self.get(UNK_TOKEN)
    }

    /// Largest id in the vocabulary.
    pub fn max_id(&self) -> Option<i64> {
        self.map.values().copied().max()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.map.iter().map(|(token, &id)| (token.as_str(), id))
    }

    /// Entries sorted by ascending id. Tokens sharing an id keep insertion order.
    pub fn iter_by_id(&self) -> impl Iterator<Item = (&str, i64)> {
        let mut entries: Vec<(&str, i64)> = self.iter().collect();
        entries.sort_by_key(|&(_, id)| id);
        entries.into_iter()
    }

    /// Get the vocabulary size.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(token, id)| (token.into(), id))
                .collect(),
        }
    }
}
