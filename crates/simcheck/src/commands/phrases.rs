//! Phrases command — pairwise phrase matching between two files.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use simcheck_core::config::Config;
use simcheck_core::engine::EngineConfig;
use simcheck_core::phrase::{self, MatchOptions};
use simcheck_core::tokenize::tokenize;

use super::read_input_file;

/// Arguments for the `phrases` subcommand.
#[derive(Args, Debug)]
pub struct PhrasesArgs {
    /// Document whose phrases are searched for.
    pub source: Utf8PathBuf,

    /// Document to search in.
    pub target: Utf8PathBuf,

    /// Phrase length in tokens.
    #[arg(long)]
    pub ngram_size: Option<usize>,

    /// Report overlapping distinct phrases of lowercased words instead of
    /// claiming spans.
    #[arg(long)]
    pub allow_overlap: bool,
}

/// Print every phrase of `source` that also occurs in `target`.
#[instrument(name = "cmd_phrases", skip_all, fields(source = %args.source, target = %args.target))]
pub fn cmd_phrases(
    args: PhrasesArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = MatchOptions {
        ngram_size: args.ngram_size.unwrap_or(config.ngram_size),
        allow_overlap: args.allow_overlap || config.allow_overlap,
    };
    debug!(?options, "executing phrases command");

    EngineConfig {
        ngram_size: options.ngram_size,
        ..EngineConfig::default()
    }
    .validate()?;

    let source = read_input_file(&args.source, max_input_bytes)?;
    let target = read_input_file(&args.target, max_input_bytes)?;

    let report = phrase::match_phrases_with(&tokenize(&source), &tokenize(&target), options);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} matching {}-word phrases, {} of {} source phrases",
        report.matches.len().bold(),
        report.ngram_size,
        format!("{:.2}%", report.coverage_pct).bold(),
        report.source_ngrams,
    );
    for m in &report.matches {
        println!(
            "  {} {}",
            format!("[{}..{}]", m.start, m.end).dimmed(),
            m.phrase
        );
    }

    Ok(())
}
