//! TF-IDF vector scoring.
//!
//! Every comparison builds its own corpus from the source plus all targets,
//! weights each term by `tf * idf` with the smoothed inverse document
//! frequency `ln((1 + N) / (1 + df)) + 1`, and scores each target by the
//! cosine between its weight vector and the source's.
//!
//! Vectors are kept sparse in ordered maps so summation order, and with it
//! every score, is identical across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tokenize::tokenize;

/// Two or more word characters, bounded on both sides.
static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// How vector-mode terms are extracted from a text body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TermAnalyzer {
    /// Lowercased runs of two or more word characters; single characters
    /// and punctuation are dropped.
    #[default]
    Words,
    /// The whitespace tokenizer, unchanged (case- and punctuation-sensitive).
    Whitespace,
}

impl TermAnalyzer {
    /// Returns the analyzer name as used in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Whitespace => "whitespace",
        }
    }

    /// Extract the terms of `text`, in order, duplicates included.
    pub fn terms(self, text: &str) -> Vec<String> {
        match self {
            Self::Words => {
                let lowered = text.to_lowercase();
                WORD_PATTERN
                    .find_iter(&lowered)
                    .map(|m| m.as_str().to_string())
                    .collect()
            }
            Self::Whitespace => tokenize(text)
                .as_slice()
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        }
    }
}

impl std::fmt::Display for TermAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sparse term-weight vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    weights: BTreeMap<String, f64>,
}

impl TermVector {
    /// Euclidean length of the vector.
    pub fn magnitude(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .filter_map(|(term, w)| large.weights.get(term).map(|v| w * v))
            .sum()
    }

    /// Cosine similarity in `[0, 1]`; `0` when either vector has no length.
    pub fn cosine(&self, other: &Self) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }

    /// Number of distinct terms with a weight.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the vector has no terms.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// TF-IDF weight vectors for a fixed corpus.
#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    vectors: Vec<TermVector>,
}

impl TfIdfModel {
    /// Fit the corpus and weight every document in it.
    pub fn fit<S: AsRef<str>>(documents: &[S], analyzer: TermAnalyzer) -> Self {
        let counts: Vec<BTreeMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = BTreeMap::new();
                for term in analyzer.terms(doc.as_ref()) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in &counts {
            let unique: BTreeSet<&str> = tf.keys().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: BTreeMap<&str, f64> = doc_freq
            .iter()
            .map(|(term, &df)| (*term, ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = counts
            .iter()
            .map(|tf| TermVector {
                weights: tf
                    .iter()
                    .map(|(term, &count)| {
                        let weight = count as f64 * idf.get(term.as_str()).copied().unwrap_or(0.0);
                        (term.clone(), weight)
                    })
                    .collect(),
            })
            .collect();

        Self { vectors }
    }

    /// The weight vector of the document at `index` in fit order.
    pub fn vector(&self, index: usize) -> Option<&TermVector> {
        self.vectors.get(index)
    }

    /// Number of fitted documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the model was fit on an empty corpus.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Cosine similarity of `source` against each target, in target order.
///
/// The IDF is computed over the source and all targets together.
#[tracing::instrument(
    skip_all,
    fields(source_len = source.len(), targets = targets.len(), %analyzer)
)]
pub fn score_corpus<S: AsRef<str>>(
    source: &str,
    targets: &[S],
    analyzer: TermAnalyzer,
) -> Vec<f64> {
    let corpus: Vec<&str> = std::iter::once(source)
        .chain(targets.iter().map(AsRef::as_ref))
        .collect();
    let model = TfIdfModel::fit(&corpus, analyzer);

    let Some(source_vec) = model.vector(0) else {
        return Vec::new();
    };
    (1..model.len())
        .filter_map(|i| model.vector(i).map(|v| source_vec.cosine(v)))
        .collect()
}

/// Arithmetic mean of pairwise cosine values; `0` for an empty list.
pub fn overall_similarity(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
