use std::sync::Arc;

use lm_store::{BootstrapOptions, BootstrapReport, EventRecord, append_event, clock};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::Settings;

#[derive(Clone)]
pub struct LmServer {
    settings: Arc<Settings>,
    tool_router: ToolRouter<Self>,
}

impl LmServer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            tool_router: Self::tool_router(),
        }
    }
}

/// JSON view of one bootstrap run, shared by `lm bootstrap --json`.
pub(crate) fn report_json(report: &BootstrapReport) -> serde_json::Value {
    serde_json::json!({
        "date": report.date,
        "status": report.status.map(|s| s.as_str()),
        "cache_error": report.cache_error,
        "artifact": report.artifact,
    })
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct BootstrapRequest {
    /// Day to snapshot as YYYY-MM-DD. Defaults to today.
    date: Option<String>,
    /// Optional token budget for the whole snapshot (default 3000).
    max_tokens: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct LogEventRequest {
    /// Short category such as "health", "work" or "family"
    category: String,
    /// What happened, in a few words
    event: String,
    /// Optional free-text details
    details: Option<String>,
    /// Optional comma-separated tags
    tags: Option<String>,
}

#[tool_router]
impl LmServer {
    #[tool(
        description = "Load the user's life context: standing rules from their governance notes plus today's daily log, with anything new since the last session listed first. Call this at the START of every session. The result is cached per day, so repeated calls are cheap and return identical text until the log changes."
    )]
    async fn lm_bootstrap(
        &self,
        Parameters(req): Parameters<BootstrapRequest>,
    ) -> Result<CallToolResult, McpError> {
        let settings = Arc::clone(&self.settings);
        let report = tokio::task::spawn_blocking(move || {
            settings.bootstrapper().run(&BootstrapOptions {
                date: req.date,
                max_tokens: req.max_tokens,
            })
        })
        .await
        .map_err(|e| McpError::internal_error(format!("bootstrap task failed: {e}"), None))?;

        Ok(json_result(&report_json(&report)))
    }

    #[tool(
        description = "Append an event to today's daily note as a timestamped line. Use for things the user wants remembered about their day: meals, workouts, appointments, moods, decisions. The next lm_bootstrap call surfaces it under the new-since-last-session heading."
    )]
    async fn lm_log_event(
        &self,
        Parameters(req): Parameters<LogEventRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.event.trim().is_empty() {
            return Err(McpError::invalid_params("event must not be empty", None));
        }
        let settings = Arc::clone(&self.settings);
        let (line, target) = tokio::task::spawn_blocking(move || {
            let record = EventRecord {
                time: clock::clock_hhmm(),
                category: req.category,
                event: req.event,
                details: req.details.unwrap_or_default(),
                tags: req.tags.unwrap_or_default(),
            };
            let line = record.to_line();
            let command = settings.command_source();
            append_event(&settings.vault, Some(&command), &clock::today(), &line)
                .map(|target| (line, target))
        })
        .await
        .map_err(|e| McpError::internal_error(format!("log task failed: {e}"), None))?
        .map_err(|e| McpError::internal_error(format!("failed to append event: {e}"), None))?;

        let target = match target {
            lm_store::AppendTarget::Command => "note application".to_string(),
            lm_store::AppendTarget::File(path) => path.display().to_string(),
        };
        Ok(json_result(&serde_json::json!({
            "line": line,
            "target": target,
        })))
    }
}

#[tool_handler]
impl ServerHandler for LmServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "You have access to the user's personal daily log and their standing rules.\n\n\
                 1. At session start, call lm_bootstrap and read the result silently. \
                    The 'Standing Rules' section holds constraints you must follow. \
                    'Since you last spoke' lists what was logged after the previous session.\n\
                 2. When the user mentions something worth keeping about their day, \
                    call lm_log_event with a category, a short event and optional details/tags.\n\
                 3. If the result is LIFE_CONTEXT_ERROR.md, continue without it and mention \
                    that the life context could not be loaded."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
