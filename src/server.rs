use std::sync::Arc;

use rmcp::RoleServer;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use serde_json::{Value, json};

use crate::error::ServiceResult;
use crate::tools::{
    ToolContext, clear_ideas, clear_ideas::ClearIdeasParams, iterate_idea,
    iterate_idea::IterateIdeaParams, list_ideas, list_ideas::ListIdeasParams, prepare_context,
    prepare_context::PrepareContextParams, repo_status, save_ideas, save_ideas::SaveIdeasParams,
};
use crate::types::IdeaStats;

pub const STORAGE_URI: &str = "rabbit://ideas/storage";
pub const STATS_URI: &str = "rabbit://ideas/stats";

const JSON_MIME: &str = "application/json";

#[derive(Clone)]
pub struct IdeasServer {
    context: Arc<ToolContext>,
    pub tool_router: ToolRouter<IdeasServer>,
}

#[tool_router]
impl IdeasServer {
    pub fn new(context: ToolContext) -> Self {
        Self {
            context: Arc::new(context),
            tool_router: Self::tool_router(),
        }
    }

    pub fn instructions() -> String {
        include_str!("../docs/instructions.md").to_string()
    }

    /// Runs one operation off the async runtime (storage and GitHub reads
    /// block) and turns its outcome into a tool result.
    async fn run_tool<F>(&self, tool: &'static str, op: F) -> Result<CallToolResult, ErrorData>
    where
        F: FnOnce(&ToolContext) -> ServiceResult<Value> + Send + 'static,
    {
        let context = Arc::clone(&self.context);
        let outcome = tokio::task::spawn_blocking(move || op(&context))
            .await
            .map_err(|e| ErrorData::internal_error(format!("{tool} did not complete: {e}"), None))?;
        Ok(tool_result(tool, outcome))
    }

    #[tool(
        name = "prepare-ideas-context",
        description = "Prepares context for generating creative and unique Rabbit R1 creation app ideas based on the current SDK structure and features. After generating ideas, you MUST call save-ideas to store them."
    )]
    async fn prepare_ideas_context(
        &self,
        Parameters(params): Parameters<PrepareContextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run_tool("prepare-ideas-context", move |ctx| {
            prepare_context::run(params, ctx)
        })
        .await
    }

    #[tool(
        name = "list-ideas",
        description = "Retrieves previously suggested Rabbit R1 creation app ideas, optionally filtered by keyword. Each idea carries the index to use with iterate-idea."
    )]
    async fn list_ideas(
        &self,
        Parameters(params): Parameters<ListIdeasParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run_tool("list-ideas", move |ctx| list_ideas::run(params, ctx))
            .await
    }

    #[tool(
        name = "iterate-idea",
        description = "Takes a previous idea by index and frames variations or improvements of it in the requested direction."
    )]
    async fn iterate_idea(
        &self,
        Parameters(params): Parameters<IterateIdeaParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run_tool("iterate-idea", move |ctx| iterate_idea::run(params, ctx))
            .await
    }

    #[tool(
        name = "repo-status",
        description = "Fetches the current status of the Rabbit R1 creations SDK GitHub repository including structure, recent commits and README."
    )]
    async fn repo_status(&self) -> Result<CallToolResult, ErrorData> {
        self.run_tool("repo-status", repo_status::run).await
    }

    #[tool(
        name = "save-ideas",
        description = "Saves newly generated Rabbit R1 creation ideas to persistent storage. MUST be called after generating ideas so they are remembered and not repeated."
    )]
    async fn save_ideas(
        &self,
        Parameters(params): Parameters<SaveIdeasParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run_tool("save-ideas", move |ctx| save_ideas::run(params, ctx))
            .await
    }

    #[tool(
        name = "clear-ideas",
        description = "Clears all previously suggested ideas from memory. Irreversible; requires confirm=true."
    )]
    async fn clear_ideas(
        &self,
        Parameters(params): Parameters<ClearIdeasParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run_tool("clear-ideas", move |ctx| clear_ideas::run(params, ctx))
            .await
    }

    /// Body of a readable resource, or `None` for unknown URIs.
    pub fn resource_body(&self, uri: &str) -> Option<String> {
        let doc = self.context.store.load();
        let value = match uri {
            STORAGE_URI => serde_json::to_value(&doc),
            STATS_URI => serde_json::to_value(IdeaStats::from_document(&doc)),
            _ => return None,
        };
        Some(pretty(&value.unwrap_or(Value::Null)))
    }
}

/// Successful results carry the pretty-printed body; failures carry
/// `{"error", "kind"}` and set `isError` so the caller sees them as a tool
/// error rather than a protocol failure.
pub fn tool_result(tool: &str, outcome: ServiceResult<Value>) -> CallToolResult {
    match outcome {
        Ok(body) => CallToolResult::success(vec![Content::text(pretty(&body))]),
        Err(err) => {
            tracing::warn!(tool, kind = err.kind(), error = %err, "tool call failed");
            let body = json!({ "error": err.to_string(), "kind": err.kind() });
            CallToolResult::error(vec![Content::text(body.to_string())])
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.to_string());
    raw.mime_type = Some(JSON_MIME.to_string());
    raw.no_annotation()
}

#[tool_handler]
impl rmcp::ServerHandler for IdeasServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(Self::instructions()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _ctx: rmcp::service::RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: vec![
                resource(
                    STORAGE_URI,
                    "Ideas Storage",
                    "Current storage of all suggested ideas and repo cache",
                ),
                resource(STATS_URI, "Ideas Statistics", "Statistics about generated ideas"),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _ctx: rmcp::service::RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        match self.resource_body(&uri) {
            Some(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, uri)],
            }),
            None => Err(ErrorData::resource_not_found(
                "Unknown resource URI",
                Some(json!({ "uri": uri })),
            )),
        }
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _ctx: rmcp::service::RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: Vec::new(),
        })
    }
}
