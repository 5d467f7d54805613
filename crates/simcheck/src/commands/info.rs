//! Info command implementation

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use simcheck_core::config::{Config, ConfigSources};
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    mode: String,
    ngram_size: usize,
    min_coverage: f64,
    allow_overlap: bool,
    vector_analyzer: String,
    corpus_dirs: Vec<String>,
    corpus_extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_base_url: Option<String>,
    /// `None` when the limit is disabled.
    max_input_bytes: Option<usize>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            mode: config.mode.to_string(),
            ngram_size: config.ngram_size,
            min_coverage: config.min_coverage,
            allow_overlap: config.allow_overlap,
            vector_analyzer: config.vector_analyzer.to_string(),
            corpus_dirs: config.corpus_dirs.iter().map(|d| d.to_string()).collect(),
            corpus_extensions: config.corpus_extensions.clone(),
            document_base_url: config.document_base_url.clone(),
            max_input_bytes: config.input_limit(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }

    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = cfg.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }

    println!();
    println!("{}", "Scoring".bold().underline());
    println!("{}: {}", "Mode".dimmed(), cfg.mode);
    println!("{}: {}", "N-gram size".dimmed(), cfg.ngram_size);
    println!("{}: {:.1}%", "Min coverage".dimmed(), cfg.min_coverage);
    println!("{}: {}", "Allow overlap".dimmed(), cfg.allow_overlap);
    println!("{}: {}", "Vector analyzer".dimmed(), cfg.vector_analyzer);

    println!();
    println!("{}", "Corpus".bold().underline());
    print_list("Directories", &cfg.corpus_dirs);
    print_list("Extensions", &cfg.corpus_extensions);
    match cfg.document_base_url {
        Some(ref url) => println!("{}: {}", "Base URL".dimmed(), url.cyan()),
        None => println!("{}: {}", "Base URL".dimmed(), "(not set)".dimmed()),
    }
    match cfg.max_input_bytes {
        Some(max) => println!("{}: {} bytes", "Input limit".dimmed(), max),
        None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
    }

    Ok(())
}

/// Print a comma-separated list or "(not set)".
fn print_list(label: &str, values: &[String]) {
    if values.is_empty() {
        println!("{}: {}", label.dimmed(), "(not set)".dimmed());
    } else {
        println!("{}: {}", label.dimmed(), values.join(", "));
    }
}
