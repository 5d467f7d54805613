//! Compare command — score a document against a reference corpus.

use std::collections::HashSet;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use simcheck_core::config::Config;
use simcheck_core::engine::{self, AggregateResult, MatchKind, ScoringMode, TextDocument};
use simcheck_core::report::render_report;

use super::read_input_file;

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Document to check.
    pub source: Utf8PathBuf,

    /// Directory of reference documents (repeatable; overrides `corpus_dirs`).
    #[arg(long, value_name = "DIR")]
    pub corpus: Vec<Utf8PathBuf>,

    /// Individual reference file (repeatable).
    #[arg(long, value_name = "FILE")]
    pub target: Vec<Utf8PathBuf>,

    /// Scoring backend.
    #[arg(long, value_enum)]
    pub mode: Option<ScoringMode>,

    /// Phrase length in tokens.
    #[arg(long)]
    pub ngram_size: Option<usize>,

    /// Coverage percentage a document must exceed to count.
    #[arg(long, value_name = "PCT")]
    pub min_coverage: Option<f64>,

    /// Report overlapping distinct phrases of lowercased words instead of
    /// claiming spans.
    #[arg(long)]
    pub allow_overlap: bool,

    /// Sort documents by similarity, highest first.
    #[arg(long)]
    pub ranked: bool,

    /// Write a plain-text report to FILE.
    #[arg(long, value_name = "FILE")]
    pub report: Option<Utf8PathBuf>,
}

/// A reference document loaded from disk.
#[derive(Debug)]
struct LoadedDocument {
    id: String,
    text: String,
    location: String,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    source: &'a str,
    #[serde(flatten)]
    result: &'a AggregateResult,
}

/// Compare a source file against every reference document.
#[instrument(name = "cmd_compare", skip_all, fields(source = %args.source))]
pub fn cmd_compare(
    args: CompareArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(
        corpus = ?args.corpus,
        targets = args.target.len(),
        mode = ?args.mode,
        "executing compare command"
    );

    let mut engine_config = config.engine_config();
    if let Some(mode) = args.mode {
        engine_config.mode = mode;
    }
    if let Some(n) = args.ngram_size {
        engine_config.ngram_size = n;
    }
    if let Some(pct) = args.min_coverage {
        engine_config.min_significant_coverage_pct = pct;
    }
    engine_config.allow_overlap |= args.allow_overlap;
    engine_config.validate()?;

    let source = read_input_file(&args.source, max_input_bytes)?;

    let corpus_dirs = if args.corpus.is_empty() {
        &config.corpus_dirs
    } else {
        &args.corpus
    };
    if corpus_dirs.is_empty() && args.target.is_empty() {
        bail!("no reference documents: pass --corpus or --target, or set corpus_dirs in config");
    }

    let mut paths = Vec::new();
    for dir in corpus_dirs {
        paths.extend(corpus_files(dir, &config.corpus_extensions)?);
    }
    paths.extend(args.target.iter().cloned());
    let paths = dedup_paths(paths);

    let documents = load_documents(
        &args.source,
        &paths,
        config.document_base_url.as_deref(),
        max_input_bytes,
        global_json || quiet,
    );
    let targets: Vec<TextDocument<'_>> = documents
        .iter()
        .map(|d| TextDocument::new(&d.id, &d.text).with_location(&d.location))
        .collect();

    let mut result = engine::aggregate(&source, &targets, &engine_config)
        .with_context(|| format!("failed to compare {}", args.source))?;
    if args.ranked {
        result = result.ranked();
    }

    if let Some(ref report_path) = args.report {
        std::fs::write(report_path, render_report(&source, &result, true))
            .with_context(|| format!("failed to write report to {report_path}"))?;
        info!(report = %report_path, "report written");
    }

    if global_json {
        let output = CompareOutput {
            source: args.source.as_str(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&args.source, &result, documents.len());
        if let Some(ref report_path) = args.report {
            println!("{}: {}", "Report".dimmed(), report_path.cyan());
        }
    }

    Ok(())
}

/// Files in `dir` with one of `extensions`, sorted by name.
fn corpus_files(dir: &Utf8Path, extensions: &[String]) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let entries = dir
        .read_dir_utf8()
        .with_context(|| format!("failed to read corpus directory {dir}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read corpus directory {dir}"))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let wanted = path
            .extension()
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if wanted {
            files.push(path.to_path_buf());
        } else {
            debug!(file = %path, "skipping file with unlisted extension");
        }
    }
    files.sort();
    Ok(files)
}

/// Drop repeated references to the same file, keeping the first.
fn dedup_paths(paths: Vec<Utf8PathBuf>) -> Vec<Utf8PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| {
            let key = path.canonicalize_utf8().unwrap_or_else(|_| path.clone());
            let fresh = seen.insert(key);
            if !fresh {
                debug!(file = %path, "skipping duplicate reference");
            }
            fresh
        })
        .collect()
}

/// Read every target, skipping the source itself and anything unreadable,
/// oversized, or empty.
fn load_documents(
    source: &Utf8Path,
    paths: &[Utf8PathBuf],
    base_url: Option<&str>,
    max_input_bytes: Option<usize>,
    quiet_progress: bool,
) -> Vec<LoadedDocument> {
    let source_canonical = source.canonicalize_utf8().ok();

    let bar = progress_bar(paths.len() as u64, quiet_progress);

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        bar.inc(1);
        bar.set_message(path.file_name().unwrap_or_default().to_string());

        if source_canonical.is_some() && path.canonicalize_utf8().ok() == source_canonical {
            debug!(file = %path, "skipping the source document");
            continue;
        }
        let text = match read_input_file(path, max_input_bytes) {
            Ok(text) => text,
            Err(err) => {
                info!(file = %path, error = %err, "skipping unreadable document");
                continue;
            }
        };
        if text.trim().is_empty() {
            info!(file = %path, "skipping empty document");
            continue;
        }

        let id = path.file_name().unwrap_or(path.as_str()).to_string();
        let location = document_location(path, base_url);
        documents.push(LoadedDocument { id, text, location });
    }
    bar.finish_and_clear();

    debug!(loaded = documents.len(), candidates = paths.len(), "reference documents loaded");
    documents
}

fn progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner} [{bar:40}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

/// `<base>/<file name>` when a base URL is configured, else the path.
fn document_location(path: &Utf8Path, base_url: Option<&str>) -> String {
    match (base_url, path.file_name()) {
        (Some(base), Some(name)) => format!("{}/{name}", base.trim_end_matches('/')),
        _ => path.to_string(),
    }
}

fn print_summary(source: &Utf8Path, result: &AggregateResult, loaded: usize) {
    let overall = format!("{:.2}%", result.overall_similarity_pct);
    let overall = if result.overall_similarity_pct >= 50.0 {
        overall.red().bold().to_string()
    } else if result.overall_similarity_pct > 0.0 {
        overall.yellow().bold().to_string()
    } else {
        overall.green().bold().to_string()
    };
    println!(
        "{}: {} overall similarity ({} mode, {} documents compared)",
        source.bold(),
        overall,
        result.mode,
        loaded
    );

    if result.is_empty() {
        println!("{}", "No significant matches found.".green());
        return;
    }

    for doc in &result.documents {
        println!();
        println!(
            "{:>7.2}%  {}",
            doc.similarity_percentage,
            doc.document.bold()
        );
        if let Some(ref location) = doc.location {
            println!("          {}", location.cyan());
        }
        match doc.kind {
            MatchKind::Vector => {
                if let Some(cosine) = doc.cosine {
                    println!("          {} {cosine:.4}", "cosine".dimmed());
                }
            }
            MatchKind::Exact | MatchKind::Phrase => {
                for phrase in &doc.matching_phrases {
                    println!("          {} {phrase}", "•".dimmed());
                }
            }
        }
    }
}
