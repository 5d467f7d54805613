//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the comparison engine over MCP on stdio, so editors and other
//! tools can check text for overlap without shelling out to the CLI.
//!
//! # Architecture
//!
//! The server is a presentation layer over `simcheck-core`. Each `#[tool]`
//! method validates its typed parameters, delegates to the engine, and
//! returns the serialized result as JSON text.
//!
//! Engine errors (empty source, bad n-gram size or threshold) and oversized
//! input are reported as `invalid_params`; serialization failures as
//! `internal_error`.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use simcheck_core::engine::{self, AggregateResult, EngineConfig, ScoringMode, TextDocument};
use simcheck_core::phrase::{self, MatchOptions};
use simcheck_core::report::render_report;
use simcheck_core::tokenize::tokenize;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// One reference document supplied by the caller.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct TargetDocument {
    /// Identifier echoed back in the result.
    pub id: String,
    /// Plain text body.
    pub text: String,
    /// Where the document can be viewed.
    pub location: Option<String>,
}

/// Parameters for the `check_similarity` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CheckSimilarityParams {
    /// Name of the document being checked, echoed back.
    pub file_name: String,
    /// Caller's record identifier, echoed back.
    pub insert_id: Option<String>,
    /// Text of the document being checked.
    pub source_text: String,
    /// Reference documents to compare against.
    pub targets: Vec<TargetDocument>,
    /// Phrase length in tokens.
    pub ngram_size: Option<usize>,
    /// Coverage percentage a document must exceed to count (0-100).
    pub min_coverage: Option<f64>,
    /// Scoring backend: "phrase" or "vector".
    pub mode: Option<ScoringMode>,
    /// Sort documents by similarity, highest first.
    #[serde(default)]
    pub ranked: bool,
    /// Include a plain-text report in the response.
    #[serde(default)]
    pub include_report: bool,
}

/// Parameters for the `match_phrases` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MatchPhrasesParams {
    /// Text whose phrases are searched for.
    pub source: String,
    /// Text to search in.
    pub target: String,
    /// Phrase length in tokens.
    pub ngram_size: Option<usize>,
    /// Report overlapping distinct phrases of lowercased words instead of
    /// claiming spans.
    #[serde(default)]
    pub allow_overlap: bool,
}

#[derive(Serialize)]
struct CheckSimilarityResponse {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    insert_id: Option<String>,
    #[serde(flatten)]
    result: AggregateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
}

/// MCP server exposing the comparison engine.
///
/// Each `#[tool]` method in the `#[tool_router]` impl block is automatically
/// registered and callable via the MCP protocol.
#[derive(Clone)]
pub struct SimcheckServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    engine: EngineConfig,
    max_input_bytes: Option<usize>,
}

impl Default for SimcheckServer {
    fn default() -> Self {
        Self::new(
            EngineConfig::default(),
            Some(simcheck_core::DEFAULT_MAX_INPUT_BYTES),
        )
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

#[tool_router]
impl SimcheckServer {
    /// Create a server using `engine` as the default settings for every call.
    pub fn new(engine: EngineConfig, max_input_bytes: Option<usize>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
            max_input_bytes,
        }
    }

    fn check_size(&self, field: &str, text: &str) -> Result<(), McpError> {
        match self.max_input_bytes {
            Some(max) if text.len() > max => Err(McpError::invalid_params(
                format!("{field} too large: {} bytes (limit: {max} bytes)", text.len()),
                None,
            )),
            _ => Ok(()),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let text = if params.format == "json" {
            to_json(&serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "description": env!("CARGO_PKG_DESCRIPTION"),
                "defaults": {
                    "mode": self.engine.mode,
                    "ngram_size": self.engine.ngram_size,
                    "min_coverage": self.engine.min_significant_coverage_pct,
                },
            }))?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Score a document against caller-supplied reference documents.
    #[tool(
        description = "Compare a source text against reference documents. Returns overall similarity and the matching phrases per document."
    )]
    #[tracing::instrument(
        skip(self, params),
        fields(otel.kind = "server", file_name = %params.file_name, targets = params.targets.len())
    )]
    fn check_similarity(
        &self,
        Parameters(params): Parameters<CheckSimilarityParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "check_similarity", mode = ?params.mode, "executing MCP tool");

        self.check_size("source_text", &params.source_text)?;
        for target in &params.targets {
            self.check_size(&format!("target {}", target.id), &target.text)?;
        }

        let mut config = self.engine;
        if let Some(mode) = params.mode {
            config.mode = mode;
        }
        if let Some(n) = params.ngram_size {
            config.ngram_size = n;
        }
        if let Some(pct) = params.min_coverage {
            config.min_significant_coverage_pct = pct;
        }

        let targets: Vec<TextDocument<'_>> = params
            .targets
            .iter()
            .map(|t| {
                let doc = TextDocument::new(&t.id, &t.text);
                match t.location {
                    Some(ref location) => doc.with_location(location),
                    None => doc,
                }
            })
            .collect();

        let mut result = engine::aggregate(&params.source_text, &targets, &config)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        if params.ranked {
            result = result.ranked();
        }
        let report = params
            .include_report
            .then(|| render_report(&params.source_text, &result, false));

        let overall = result.overall_similarity_pct;
        let json = to_json(&CheckSimilarityResponse {
            file_name: params.file_name,
            insert_id: params.insert_id,
            result,
            report,
        })?;

        tracing::info!(tool = "check_similarity", overall, "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Match phrases between two texts.
    #[tool(
        description = "Find the n-word phrases of a source text that also occur in a target text, with their token positions and coverage."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn match_phrases(
        &self,
        Parameters(params): Parameters<MatchPhrasesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "match_phrases",
            ngram_size = ?params.ngram_size,
            "executing MCP tool"
        );

        self.check_size("source", &params.source)?;
        self.check_size("target", &params.target)?;

        let options = MatchOptions {
            ngram_size: params.ngram_size.unwrap_or(self.engine.ngram_size),
            allow_overlap: params.allow_overlap,
        };
        EngineConfig {
            ngram_size: options.ngram_size,
            ..self.engine
        }
        .validate()
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let report = phrase::match_phrases_with(
            &tokenize(&params.source),
            &tokenize(&params.target),
            options,
        );
        let json = to_json(&report)?;

        tracing::info!(
            tool = "match_phrases",
            matches = report.matches.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for SimcheckServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use check_similarity to score a text against reference documents \
                 and match_phrases to list the phrases two texts share.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
