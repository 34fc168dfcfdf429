//! Rule-based query text normalization.
//!
//! Rewrites raw query text into a whitespace-separated form the vocabulary was
//! built against. The rules run strictly in table order: contractions are
//! expanded before punctuation is stripped, and digit suffixes are rewritten
//! after apostrophes are gone.

use regex::Regex;
use std::sync::OnceLock;

/// Ordered `(pattern, replacement)` rewrite table.
const RULES: &[(&str, &str)] = &[
    // `+-=` is a range here, so `:`, `;` and `<` survive as well.
    (r"[^A-Za-z0-9^,!./'+-=]", " "),
    (r"what's", "what is "),
    (r"'s", " "),
    (r"'ve", " have "),
    (r"can't", "cannot "),
    (r"n't", " not "),
    (r"i'm", "i am "),
    (r"'re", " are "),
    (r"'d", " would "),
    (r"'ll", " will "),
    (r",", " "),
    (r"\.", " "),
    (r"!", " ! "),
    (r"/", " "),
    (r"\^", " ^ "),
    (r"\+", " + "),
    (r"-", " - "),
    (r"=", " = "),
    (r"'", " "),
    (r"(\d+)(k)", "${1}000"),
    (r":", " : "),
    (r" e g ", " eg "),
    (r" b g ", " bg "),
    (r" u s ", " american "),
    // NUL followed by `s`; step one already replaced NUL with a space.
    (r"\x00s", "0"),
    (r" 9 11 ", "911"),
    (r"e - mail", "email"),
    (r"j k", "jk"),
    (r"\s{2,}", " "),
];

static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();

/// Compiled rewrite pipeline.
pub struct TextNormalizer {
    rules: Vec<(Regex, &'static str)>,
}

impl TextNormalizer {
    pub fn new() -> Self {
        let rules = RULES
            .iter()
            .map(|&(pattern, replacement)| {
                let regex = Regex::new(pattern).expect("normalization rule must compile");
                (regex, replacement)
            })
            .collect();
        Self { rules }
    }

    /// Process-wide instance, compiled on first use.
    pub fn shared() -> &'static Self {
        NORMALIZER.get_or_init(Self::new)
    }

    /// Apply every rule in order. Never fails; empty input stays empty.
    pub fn normalize(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, *replacement).into_owned()
            })
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize `text` with the shared rule set.
pub fn normalize(text: &str) -> String {
    TextNormalizer::shared().normalize(text)
}
