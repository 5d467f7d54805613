//! Core library for simcheck.
//!
//! Detects textual overlap between a source document and a set of
//! reference documents, either by exact n-gram phrase matching or by
//! TF-IDF cosine similarity, and aggregates the per-document scores into
//! an overall similarity percentage.
//!
//! # Modules
//!
//! - [`tokenize`] - Whitespace tokenization and n-gram windows
//! - [`phrase`] - Non-overlapping n-gram phrase matching
//! - [`vector`] - TF-IDF weighting and cosine similarity
//! - [`engine`] - Per-document scoring and aggregation
//! - [`report`] - Plain-text report rendering
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use simcheck_core::{EngineConfig, TextDocument, aggregate};
//!
//! let source = "the quick brown fox jumps over the lazy dog";
//! let targets = [TextDocument::new("fox.txt", "a quick brown fox jumps over a fence")];
//! let result = aggregate(source, &targets, &EngineConfig::default()).unwrap();
//!
//! for doc in &result.documents {
//!     println!("{}: {:.2}%", doc.document, doc.similarity_percentage);
//! }
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod phrase;
pub mod report;
pub mod tokenize;
pub mod vector;

pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use engine::{
    AggregateResult, EngineConfig, MatchKind, PairwiseResult, ScoringMode, TextDocument,
    aggregate, rank,
};
pub use error::{ConfigError, ConfigResult, EngineError, EngineResult};
pub use phrase::{MatchOptions, PhraseMatch, PhraseReport, match_phrases, match_phrases_with};
pub use report::render_report;
pub use tokenize::{TokenSequence, tokenize};
pub use vector::{TermAnalyzer, score_corpus};

/// Default maximum input size: 5 MiB.
///
/// Inputs larger than this are rejected unless the limit is raised with
/// `max_input_bytes` or disabled with `disable_input_limit`.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
