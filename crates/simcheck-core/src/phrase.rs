//! N-gram phrase matching.
//!
//! Finds literal `n`-token phrases of a source document that also occur in
//! a target document. The source is scanned left to right; a matched
//! window claims every source token it spans, so later windows that would
//! overlap it are skipped. Only the leftmost of a run of overlapping
//! candidates is ever reported.
//!
//! Coverage is the share of source windows that produced a match:
//! `matches / source_windows * 100`, or `0` when the source is shorter
//! than one window.
//!
//! [`MatchOptions::allow_overlap`] switches to a set intersection of
//! distinct phrases built from lowercased word terms instead.

use std::collections::HashSet;
use std::ops::Range;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tokenize::TokenSequence;
use crate::vector::TermAnalyzer;

/// Default phrase length in tokens.
pub const DEFAULT_NGRAM_SIZE: usize = 5;

/// One matched phrase and the source token range it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PhraseMatch {
    /// The matched tokens joined by single spaces.
    pub phrase: String,
    /// Index of the first source token in the match.
    pub start: usize,
    /// One past the index of the last source token in the match.
    pub end: usize,
}

impl PhraseMatch {
    /// The consumed source token indices.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether two matches claim at least one common source token.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Knobs for a single phrase comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Phrase length in tokens.
    pub ngram_size: usize,
    /// Report every distinct shared phrase instead of claiming spans.
    ///
    /// Both texts are first reduced to [`TermAnalyzer::Words`] terms
    /// (lowercased, punctuation and single characters dropped), so phrases
    /// here differ from the literal whitespace tokens of the default mode.
    /// Matches may overlap, `start`/`end` index source terms, and coverage
    /// is measured against the number of distinct source phrases.
    pub allow_overlap: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            allow_overlap: false,
        }
    }
}

/// Result of matching one source against one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhraseReport {
    /// Phrase length used for the comparison.
    pub ngram_size: usize,
    /// Number of source windows the coverage is measured against.
    pub source_ngrams: usize,
    /// Matches in source order.
    pub matches: Vec<PhraseMatch>,
    /// Share of source windows that matched, 0--100.
    pub coverage_pct: f64,
}

impl PhraseReport {
    /// The matched phrases, in source order.
    pub fn phrases(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.phrase.clone()).collect()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Match `source` against `target` with non-overlapping `n`-token phrases.
pub fn match_phrases(
    source: &TokenSequence<'_>,
    target: &TokenSequence<'_>,
    n: usize,
) -> PhraseReport {
    match_phrases_with(
        source,
        target,
        MatchOptions {
            ngram_size: n,
            allow_overlap: false,
        },
    )
}

/// Match `source` against `target` using explicit [`MatchOptions`].
#[tracing::instrument(
    level = "trace",
    skip_all,
    fields(source_len = source.len(), target_len = target.len(), n = options.ngram_size)
)]
pub fn match_phrases_with(
    source: &TokenSequence<'_>,
    target: &TokenSequence<'_>,
    options: MatchOptions,
) -> PhraseReport {
    let n = options.ngram_size;
    let (matches, source_ngrams) = if options.allow_overlap {
        distinct_shared_phrases(source, target, n)
    } else {
        claimed_phrases(source, target, n)
    };

    let coverage_pct = if source_ngrams == 0 {
        0.0
    } else {
        matches.len() as f64 / source_ngrams as f64 * 100.0
    };

    tracing::trace!(matches = matches.len(), coverage_pct, "phrase comparison done");

    PhraseReport {
        ngram_size: n,
        source_ngrams,
        matches,
        coverage_pct,
    }
}

/// Leftmost-first matching over literal tokens; each match claims its span.
fn claimed_phrases(
    source: &TokenSequence<'_>,
    target: &TokenSequence<'_>,
    n: usize,
) -> (Vec<PhraseMatch>, usize) {
    let target_ngrams: HashSet<String> = target.ngrams(n).map(|(_, gram)| gram).collect();
    let mut claimed = vec![false; source.len()];
    let mut matches = Vec::new();
    for (i, gram) in source.ngrams(n) {
        if claimed[i] {
            continue;
        }
        if target_ngrams.contains(&gram) {
            claimed[i..i + n].fill(true);
            matches.push(PhraseMatch {
                phrase: gram,
                start: i,
                end: i + n,
            });
        }
    }
    (matches, source.ngram_count(n))
}

/// Set intersection of analyzed-term phrases, first occurrence of each.
fn distinct_shared_phrases(
    source: &TokenSequence<'_>,
    target: &TokenSequence<'_>,
    n: usize,
) -> (Vec<PhraseMatch>, usize) {
    let source_terms = word_terms(source);
    let target_terms = word_terms(target);
    let target_ngrams: HashSet<String> = term_windows(&target_terms, n)
        .map(|(_, gram)| gram)
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut matches = Vec::new();
    for (i, gram) in term_windows(&source_terms, n) {
        if !seen.insert(gram.clone()) {
            continue;
        }
        if target_ngrams.contains(&gram) {
            matches.push(PhraseMatch {
                phrase: gram,
                start: i,
                end: i + n,
            });
        }
    }
    (matches, seen.len())
}

// Word terms never span whitespace, so analyzing the rejoined tokens gives
// the same terms as analyzing the raw text.
fn word_terms(tokens: &TokenSequence<'_>) -> Vec<String> {
    TermAnalyzer::Words.terms(&tokens.as_slice().join(" "))
}

fn term_windows(terms: &[String], n: usize) -> impl Iterator<Item = (usize, String)> + '_ {
    let windows = if n == 0 || n > terms.len() {
        terms[..0].windows(1)
    } else {
        terms.windows(n)
    };
    windows.enumerate().map(|(i, w)| (i, w.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    fn run(source: &str, target: &str, n: usize) -> PhraseReport {
        match_phrases(&tokenize(source), &tokenize(target), n)
    }

    fn assert_disjoint(report: &PhraseReport) {
        for (i, a) in report.matches.iter().enumerate() {
            for b in &report.matches[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn identical_five_word_sentence() {
        let report = run(
            "the quick brown fox jumps",
            "the quick brown fox jumps",
            5,
        );
        assert_eq!(report.phrases(), vec!["the quick brown fox jumps"]);
        assert_eq!(report.matches[0].range(), 0..5);
        assert!((report.coverage_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_prefix_match() {
        let report = run("a b c d e f g", "a b c d e x y", 5);
        assert_eq!(report.phrases(), vec!["a b c d e"]);
        assert_eq!(report.matches[0].range(), 0..5);
        assert_eq!(report.source_ngrams, 3);
        assert!((report.coverage_pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_overlap_gives_zero() {
        let report = run(
            "one two three four five six",
            "alpha beta gamma delta epsilon zeta",
            5,
        );
        assert!(report.is_empty());
        assert_eq!(report.coverage_pct, 0.0);
    }

    #[test]
    fn short_source_gives_zero_coverage() {
        let report = run("a b c", "a b c d e f", 5);
        assert!(report.is_empty());
        assert_eq!(report.source_ngrams, 0);
        assert_eq!(report.coverage_pct, 0.0);
    }

    #[test]
    fn short_target_gives_no_matches() {
        let report = run("a b c d e f", "a b c", 5);
        assert!(report.is_empty());
        assert_eq!(report.coverage_pct, 0.0);
    }

    #[test]
    fn empty_inputs_give_no_matches() {
        assert!(run("", "a b c d e", 5).is_empty());
        assert!(run("a b c d e", "", 5).is_empty());
        assert!(run("", "", 1).is_empty());
    }

    #[test]
    fn overlapping_candidates_keep_leftmost() {
        // Every window of the source occurs in the target, but a match
        // claims its span, so only windows starting at 0 and 3 are taken.
        let report = run("a b c d e f g", "a b c d e f g", 3);
        assert_eq!(report.phrases(), vec!["a b c", "d e f"]);
        assert_eq!(report.source_ngrams, 5);
        assert!((report.coverage_pct - 40.0).abs() < 1e-9);
        assert_disjoint(&report);
    }

    #[test]
    fn match_after_claimed_span_is_found() {
        let report = run("x y z p q r", "x y z . p q r", 3);
        assert_eq!(report.phrases(), vec!["x y z", "p q r"]);
        assert_eq!(report.matches[1].range(), 3..6);
    }

    #[test]
    fn repeated_source_phrase_matches_each_occurrence() {
        let report = run("a b a b a b", "a b", 2);
        assert_eq!(report.phrases(), vec!["a b", "a b", "a b"]);
        assert_disjoint(&report);
    }

    #[test]
    fn matching_is_case_and_punctuation_sensitive() {
        assert!(run("The Quick Brown", "the quick brown", 3).is_empty());
        assert!(run("the quick brown.", "the quick brown", 3).is_empty());
    }

    #[test]
    fn unigram_matching() {
        let report = run("a b c", "c a", 1);
        assert_eq!(report.phrases(), vec!["a", "c"]);
        assert!((report.coverage_pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_size_matches_nothing() {
        let report = run("a b c", "a b c", 0);
        assert!(report.is_empty());
        assert_eq!(report.coverage_pct, 0.0);
    }

    #[test]
    fn coverage_stays_within_bounds() {
        let texts = [
            "a b c d e f g h i j",
            "a a a a a a a a",
            "a b a b a b a b",
            "z y x w v u",
            "",
        ];
        for source in texts {
            for target in texts {
                for n in 1..=5 {
                    let report = run(source, target, n);
                    assert!(
                        (0.0..=100.0).contains(&report.coverage_pct),
                        "{source:?} vs {target:?} n={n}: {}",
                        report.coverage_pct
                    );
                    assert_disjoint(&report);
                }
            }
        }
    }

    #[test]
    fn overlap_mode_reports_distinct_shared_phrases() {
        let options = MatchOptions {
            ngram_size: 3,
            allow_overlap: true,
        };
        let report = match_phrases_with(
            &tokenize("aa bb cc dd aa bb cc"),
            &tokenize("aa bb cc dd"),
            options,
        );
        // Distinct source windows: "aa bb cc", "bb cc dd", "cc dd aa", "dd aa bb".
        assert_eq!(report.source_ngrams, 4);
        assert_eq!(report.phrases(), vec!["aa bb cc", "bb cc dd"]);
        assert!(report.matches[0].overlaps(&report.matches[1]));
        assert!((report.coverage_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_mode_ignores_case_and_punctuation() {
        let options = MatchOptions {
            ngram_size: 5,
            allow_overlap: true,
        };
        let source = tokenize("The Quick Brown Fox Jumps.");
        let target = tokenize("the quick brown fox jumps");
        let report = match_phrases_with(&source, &target, options);
        assert_eq!(report.phrases(), vec!["the quick brown fox jumps"]);
        assert!((report.coverage_pct - 100.0).abs() < 1e-9);

        // The literal matcher still treats these as different tokens.
        assert!(match_phrases(&source, &target, 5).is_empty());
    }

    #[test]
    fn overlap_mode_drops_single_character_terms() {
        let options = MatchOptions {
            ngram_size: 2,
            allow_overlap: true,
        };
        let report = match_phrases_with(&tokenize("I saw a cat"), &tokenize("saw cat"), options);
        assert_eq!(report.source_ngrams, 1);
        assert_eq!(report.phrases(), vec!["saw cat"]);
        assert_eq!(report.matches[0].range(), 0..2);
    }

    #[test]
    fn default_options_use_five_token_phrases() {
        let options = MatchOptions::default();
        assert_eq!(options.ngram_size, DEFAULT_NGRAM_SIZE);
        assert!(!options.allow_overlap);
    }
}
