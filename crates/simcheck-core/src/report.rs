//! Plain-text similarity reports.
//!
//! Renders an [`AggregateResult`] for people: the overall figure, the
//! source content, then each retained document ranked by similarity with
//! its location and matching phrases. The result itself is left untouched;
//! ranking happens on a copy.

use std::fmt::Write;

use crate::engine::{AggregateResult, MatchKind, rank};

/// Report title line.
pub const REPORT_TITLE: &str = "Detailed Similarity Report";

/// Render `result` for the given source text.
///
/// Pass `include_source = false` to leave out the source content section,
/// which can be large.
pub fn render_report(source: &str, result: &AggregateResult, include_source: bool) -> String {
    let mut documents = result.documents.clone();
    rank(&mut documents);

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{REPORT_TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(REPORT_TITLE.len()));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Overall Similarity: {:.2}%",
        result.overall_similarity_pct
    );
    let _ = writeln!(out, "Scoring mode: {}", result.mode);
    let _ = writeln!(out, "Matching documents: {}", documents.len());

    if include_source {
        let _ = writeln!(out);
        let _ = writeln!(out, "Source Document Content:");
        let _ = writeln!(out, "------------------------");
        let _ = writeln!(out, "{}", source.trim_end());
    }

    if documents.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No significant matches found.");
        return out;
    }

    for doc in &documents {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Matching Document: {} ({:.2}% similarity)",
            doc.document, doc.similarity_percentage
        );
        if let Some(ref location) = doc.location {
            let _ = writeln!(out, "View File: {location}");
        }
        match doc.kind {
            MatchKind::Vector => {
                if let Some(cosine) = doc.cosine {
                    let _ = writeln!(out, "  Cosine similarity: {cosine:.4}");
                }
            }
            MatchKind::Exact | MatchKind::Phrase => {
                for phrase in &doc.matching_phrases {
                    let _ = writeln!(out, "  Matching Phrase: {phrase}");
                }
            }
        }
    }

    out
}
