//! Labeled query corpora, label names and corpus export.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{PrepError, PrepResult};

/// One tokenized example: the raw words of a query.
pub type Example = Vec<String>;

/// Examples grouped by class label.
///
/// Label keys are the decimal strings `"0"`, `"1"`, ... as stored in the
/// corpus JSON:
/// ```json
/// { "0": [["how", "do", "i"], ["where", "is"]], "1": [["book", "a", "flight"]] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabeledCorpus {
    classes: BTreeMap<String, Vec<Example>>,
}

impl LabeledCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open corpus file {:?}", path))?;
        let corpus: LabeledCorpus = serde_json::from_reader(BufReader::new(file))
            .context("Failed to parse corpus JSON")?;
        tracing::debug!(
            classes = corpus.class_count(),
            examples = corpus.example_count(),
            "loaded corpus from {:?}",
            path
        );
        Ok(corpus)
    }

    /// Append an example under `label`.
    pub fn push<S: Into<String>>(&mut self, label: impl Into<String>, words: Vec<S>) {
        self.classes
            .entry(label.into())
            .or_default()
            .push(words.into_iter().map(Into::into).collect());
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn example_count(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.example_count() == 0
    }

    /// Classes in ascending numeric label order.
    ///
    /// Fails if a key is not a class index, or if the indices are not exactly
    /// `0..K` for `K` classes.
    pub fn ordered_classes(&self) -> PrepResult<Vec<(usize, &[Example])>> {
        let mut classes = self
            .classes
            .iter()
            .map(|(key, examples)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, key, examples.as_slice()))
                    .map_err(|_| PrepError::MalformedLabel { key: key.clone() })
            })
            .collect::<PrepResult<Vec<_>>>()?;

        classes.sort_by_key(|&(index, _, _)| index);

        // Keys like "1" and "01" name the same class.
        if let Some(pair) = classes.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(PrepError::MalformedLabel {
                key: pair[1].1.to_string(),
            });
        }

        for (expected, &(index, _, _)) in classes.iter().enumerate() {
            if index != expected {
                return Err(PrepError::LabelGap { missing: expected });
            }
        }

        Ok(classes
            .into_iter()
            .map(|(index, _, examples)| (index, examples))
            .collect())
    }

    /// Per-class example counts.
    pub fn summary(&self, names: Option<&LabelNames>) -> PrepResult<CorpusSummary> {
        let classes = self
            .ordered_classes()?
            .into_iter()
            .map(|(index, examples)| ClassSummary {
                index,
                name: names.and_then(|names| names.get(index)).map(str::to_string),
                examples: examples.len(),
            })
            .collect();
        Ok(CorpusSummary { classes })
    }

    /// Write the corpus in fastText supervised format:
    /// `__label__<name>\t<word> <word> ...`, one example per line.
    pub fn write_fasttext(&self, names: &LabelNames, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create fastText file {:?}", path))?;
        let mut writer = BufWriter::new(file);

        let mut lines = 0usize;
        for (index, examples) in self.ordered_classes()? {
            let name = names
                .get(index)
                .with_context(|| format!("No label name for class {}", index))?;
            for example in examples {
                writeln!(writer, "__label__{}\t{}", name, example.join(" "))
                    .context("Failed to write fastText line")?;
                lines += 1;
            }
        }
        writer.flush().context("Failed to flush fastText file")?;

        tracing::debug!(lines, "wrote fastText corpus to {:?}", path);
        Ok(())
    }
}

/// Class index to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelNames {
    names: Vec<String>,
}

impl LabelNames {
    /// Load label names from a JSON object mapping names to class indices:
    /// ```json
    /// { "greeting": 0, "booking": 1 }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open label file {:?}", path))?;
        let map: HashMap<String, usize> = serde_json::from_reader(BufReader::new(file))
            .context("Failed to parse label JSON")?;
        Self::from_index_map(map)
    }

    fn from_index_map(map: HashMap<String, usize>) -> Result<Self> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];
        for (name, index) in map {
            let slot = slots.get_mut(index).with_context(|| {
                format!("Label index {} for {:?} is out of range", index, name)
            })?;
            if let Some(existing) = slot.replace(name) {
                anyhow::bail!("Label index {} is assigned twice ({:?})", index, existing);
            }
        }
        let names = slots.into_iter().flatten().collect();
        Ok(Self { names })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub index: usize,
    pub name: Option<String>,
    pub examples: usize,
}

/// Example counts per class, in class order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSummary {
    pub classes: Vec<ClassSummary>,
}

impl CorpusSummary {
    pub fn total(&self) -> usize {
        self.classes.iter().map(|class| class.examples).sum()
    }
}

impl fmt::Display for CorpusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            match &class.name {
                // Names are cut to three characters to keep the table narrow.
                Some(name) => {
                    let short: String = name.chars().take(3).collect();
                    writeln!(f, "* Number of data in class {}: {}", short, class.examples)?;
                }
                None => writeln!(f, "* Number of data in class {}: {}", class.index, class.examples)?,
            }
        }
        write!(f, "+ Total: {}", self.total())
    }
}
