//! Comparison engine.
//!
//! Scores one source text against an ordered list of target documents and
//! folds the per-target results into a single overall similarity figure.
//!
//! Two interchangeable backends sit behind [`aggregate`], chosen by
//! [`EngineConfig::mode`]:
//!
//! - [`ScoringMode::Phrase`] runs the [`phrase`](crate::phrase) matcher per
//!   target and keeps targets whose coverage clears the significance
//!   threshold.
//! - [`ScoringMode::Vector`] fits one TF-IDF model over the source and all
//!   targets and reports every target's cosine.
//!
//! Either way a target whose trimmed text equals the trimmed source is
//! reported as an exact match at 100% without being scored.
//!
//! Results come back in input order. Use [`rank`] or
//! [`AggregateResult::ranked`] for a by-score ordering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::phrase::{self, DEFAULT_NGRAM_SIZE, MatchOptions, PhraseMatch};
use crate::tokenize::tokenize;
use crate::vector::{self, TermAnalyzer};

/// Phrase reported for a target identical to the source.
pub const EXACT_MATCH_PHRASE: &str = "Exact match with uploaded file";

/// Default minimum coverage a phrase-mode target must exceed to be kept.
pub const DEFAULT_MIN_SIGNIFICANT_COVERAGE_PCT: f64 = 2.0;

/// Which scoring backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ScoringMode {
    /// Non-overlapping n-gram phrase matching.
    #[default]
    Phrase,
    /// TF-IDF cosine similarity.
    Vector,
}

impl ScoringMode {
    /// Returns the mode as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Phrase => "phrase",
            Self::Vector => "vector",
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine settings for one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Phrase length in tokens (phrase mode).
    pub ngram_size: usize,
    /// Coverage a phrase-mode target must exceed to be kept, 0--100.
    pub min_significant_coverage_pct: f64,
    /// Scoring backend.
    pub mode: ScoringMode,
    /// Use overlapping distinct-phrase matching over lowercased words
    /// (phrase mode).
    pub allow_overlap: bool,
    /// Term extraction for vector mode.
    pub vector_analyzer: TermAnalyzer,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            min_significant_coverage_pct: DEFAULT_MIN_SIGNIFICANT_COVERAGE_PCT,
            mode: ScoringMode::default(),
            allow_overlap: false,
            vector_analyzer: TermAnalyzer::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.ngram_size < 1 {
            return Err(EngineError::InvalidNGramSize {
                size: self.ngram_size,
            });
        }
        let t = self.min_significant_coverage_pct;
        if !t.is_finite() || !(0.0..=100.0).contains(&t) {
            return Err(EngineError::InvalidThreshold { value: t });
        }
        Ok(())
    }

    const fn match_options(&self) -> MatchOptions {
        MatchOptions {
            ngram_size: self.ngram_size,
            allow_overlap: self.allow_overlap,
        }
    }
}

/// A borrowed document to compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDocument<'a> {
    /// Caller-chosen identifier, echoed in the result.
    pub id: &'a str,
    /// Plain text body.
    pub text: &'a str,
    /// Where the document can be viewed, if known.
    pub location: Option<&'a str>,
}

impl<'a> TextDocument<'a> {
    /// A document with no location.
    pub const fn new(id: &'a str, text: &'a str) -> Self {
        Self {
            id,
            text,
            location: None,
        }
    }

    /// Attach a location.
    #[must_use]
    pub const fn with_location(mut self, location: &'a str) -> Self {
        self.location = Some(location);
        self
    }
}

/// How a target came to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Trimmed text identical to the source.
    Exact,
    /// Shared n-gram phrases.
    Phrase,
    /// TF-IDF cosine score.
    Vector,
}

/// The score of one target against the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PairwiseResult {
    /// Target identifier.
    pub document: String,
    /// Target location, if the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// How the target matched.
    pub kind: MatchKind,
    /// Matched phrases in source order, or the exact-match marker.
    pub matching_phrases: Vec<String>,
    /// Source token spans of the matched phrases (phrase mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<PhraseMatch>,
    /// Cosine similarity (vector mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cosine: Option<f64>,
    /// Similarity to the source, 0--100.
    pub similarity_percentage: f64,
}

impl PairwiseResult {
    fn exact(doc: &TextDocument<'_>, mode: ScoringMode) -> Self {
        Self {
            document: doc.id.to_string(),
            location: doc.location.map(str::to_string),
            kind: MatchKind::Exact,
            matching_phrases: vec![EXACT_MATCH_PHRASE.to_string()],
            matches: Vec::new(),
            cosine: (mode == ScoringMode::Vector).then_some(1.0),
            similarity_percentage: 100.0,
        }
    }
}

/// The outcome of comparing a source against all targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateResult {
    /// Backend that produced the scores.
    pub mode: ScoringMode,
    /// Overall similarity, 0--100.
    pub overall_similarity_pct: f64,
    /// Weighted sum the overall figure is derived from.
    pub total_similarity: f64,
    /// Number of targets that contributed to the overall figure.
    pub total_sources: usize,
    /// Retained targets in input order.
    pub documents: Vec<PairwiseResult>,
}

impl AggregateResult {
    /// Whether no target was retained.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The result with its documents sorted by similarity, highest first.
    #[must_use]
    pub fn ranked(mut self) -> Self {
        rank(&mut self.documents);
        self
    }
}

/// Sort results by `similarity_percentage`, highest first.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank(results: &mut [PairwiseResult]) {
    results.sort_by(|a, b| b.similarity_percentage.total_cmp(&a.similarity_percentage));
}

/// Compare `source` against every target.
///
/// Fails with [`EngineError::EmptySourceText`] when the source is blank and
/// with a configuration error when `config` does not validate. Targets with
/// blank text are skipped without being counted.
#[tracing::instrument(
    skip_all,
    fields(source_len = source.len(), targets = targets.len(), mode = %config.mode)
)]
pub fn aggregate(
    source: &str,
    targets: &[TextDocument<'_>],
    config: &EngineConfig,
) -> EngineResult<AggregateResult> {
    config.validate()?;
    if source.trim().is_empty() {
        return Err(EngineError::EmptySourceText);
    }

    let result = match config.mode {
        ScoringMode::Phrase => aggregate_phrases(source, targets, config),
        ScoringMode::Vector => aggregate_vectors(source, targets, config),
    };

    info!(
        overall = result.overall_similarity_pct,
        retained = result.documents.len(),
        total_sources = result.total_sources,
        "comparison complete"
    );
    Ok(result)
}

fn aggregate_phrases(
    source: &str,
    targets: &[TextDocument<'_>],
    config: &EngineConfig,
) -> AggregateResult {
    let source_trimmed = source.trim();
    let source_tokens = tokenize(source);
    let options = config.match_options();

    let mut documents = Vec::new();
    let mut total_similarity = 0.0;
    let mut total_sources = 0usize;

    for doc in targets {
        let target_trimmed = doc.text.trim();
        if target_trimmed.is_empty() {
            debug!(document = doc.id, "skipping target with no text");
            continue;
        }

        if target_trimmed == source_trimmed {
            debug!(document = doc.id, "exact match");
            documents.push(PairwiseResult::exact(doc, ScoringMode::Phrase));
            total_similarity += 100.0;
            total_sources += 1;
            continue;
        }

        let report = phrase::match_phrases_with(&source_tokens, &tokenize(doc.text), options);
        if report.is_empty() || report.coverage_pct <= config.min_significant_coverage_pct {
            debug!(
                document = doc.id,
                matches = report.matches.len(),
                coverage_pct = report.coverage_pct,
                "below significance threshold"
            );
            continue;
        }

        debug!(
            document = doc.id,
            matches = report.matches.len(),
            coverage_pct = report.coverage_pct,
            "retained"
        );
        total_similarity += report.coverage_pct * report.matches.len() as f64;
        total_sources += 1;
        documents.push(PairwiseResult {
            document: doc.id.to_string(),
            location: doc.location.map(str::to_string),
            kind: MatchKind::Phrase,
            matching_phrases: report.phrases(),
            matches: report.matches,
            cosine: None,
            similarity_percentage: report.coverage_pct,
        });
    }

    let mean = if total_sources > 0 {
        total_similarity / total_sources as f64
    } else {
        0.0
    };
    // The mean is already a percentage; the extra factor of 100 is kept
    // for compatibility with existing reports. See DESIGN.md.
    let overall_similarity_pct = (mean * 100.0).min(100.0);

    AggregateResult {
        mode: ScoringMode::Phrase,
        overall_similarity_pct,
        total_similarity,
        total_sources,
        documents,
    }
}

fn aggregate_vectors(
    source: &str,
    targets: &[TextDocument<'_>],
    config: &EngineConfig,
) -> AggregateResult {
    let source_trimmed = source.trim();
    let scored: Vec<&TextDocument<'_>> = targets
        .iter()
        .filter(|doc| {
            let keep = !doc.text.trim().is_empty();
            if !keep {
                debug!(document = doc.id, "skipping target with no text");
            }
            keep
        })
        .collect();
    let texts: Vec<&str> = scored.iter().map(|doc| doc.text).collect();
    let cosines = vector::score_corpus(source, &texts, config.vector_analyzer);

    let documents: Vec<PairwiseResult> = scored
        .iter()
        .zip(cosines)
        .map(|(doc, cosine)| {
            if doc.text.trim() == source_trimmed {
                return PairwiseResult::exact(doc, ScoringMode::Vector);
            }
            PairwiseResult {
                document: doc.id.to_string(),
                location: doc.location.map(str::to_string),
                kind: MatchKind::Vector,
                matching_phrases: Vec::new(),
                matches: Vec::new(),
                cosine: Some(cosine),
                similarity_percentage: cosine * 100.0,
            }
        })
        .collect();

    let cosines: Vec<f64> = documents.iter().filter_map(|d| d.cosine).collect();
    let overall_similarity_pct = (vector::overall_similarity(&cosines) * 100.0).clamp(0.0, 100.0);
    let total_similarity = documents.iter().map(|d| d.similarity_percentage).sum();

    AggregateResult {
        mode: ScoringMode::Vector,
        overall_similarity_pct,
        total_similarity,
        total_sources: documents.len(),
        documents,
    }
}
