use crate::client::AutoselectClient;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AutoselectMcpServer {
    client: Arc<AutoselectClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl AutoselectMcpServer {
    /// Create a new MCP server with default configuration
    pub async fn new() -> Result<Self> {
        let client = AutoselectClient::new().await?;
        Self::with_client(Arc::new(client))
    }

    /// Create a new MCP server with an existing client
    pub fn with_client(client: Arc<AutoselectClient>) -> Result<Self> {
        Ok(Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &AutoselectClient {
        &self.client
    }
}

#[tool_router(router = tool_router)]
impl AutoselectMcpServer {
    #[tool(
        description = "Select the minimal set of project files needed for a task. Returns the selected paths, a confidence score, and clarification questions when the task is ambiguous; resubmit with `clarifications` to get a final answer."
    )]
    async fn select_files(
        &self,
        Parameters(req): Parameters<SelectionRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .select_files(req)
            .await
            .map_err(|e| e.to_user_string())?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }

    #[tool(
        description = "Extract classes, functions, references, imports and exports from project files using tree-sitter"
    )]
    async fn extract_symbols(
        &self,
        Parameters(req): Parameters<ExtractSymbolsRequest>,
    ) -> Result<String, String> {
        let response = self
            .client
            .extract_symbols(req)
            .await
            .map_err(|e| e.to_user_string())?;

        serde_json::to_string_pretty(&response).map_err(|e| format!("Serialization failed: {}", e))
    }

    #[tool(description = "Re-embed one changed file in the project's selection index")]
    async fn refresh_file(
        &self,
        Parameters(req): Parameters<RefreshFileRequest>,
    ) -> Result<String, String> {
        self.client
            .refresh_file(&req.base_dir, &req.relative_path)
            .await
            .map_err(|e| e.to_user_string())?;

        Ok(format!("Refreshed {}", req.relative_path))
    }
}

// Prompts for slash commands
#[prompt_router]
impl AutoselectMcpServer {
    #[prompt(
        name = "autoselect",
        description = "Pick the files of a project that a task needs"
    )]
    async fn autoselect_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<GetPromptResult, McpError> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let task = args.get("task").and_then(|v| v.as_str()).unwrap_or("");

        let messages = vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Please select the files in '{}' needed for this task: {}. List the project's files as tree_paths and call select_files; if it asks clarification questions, answer them and call it again with the answers as clarifications.",
                path, task
            ),
        )];

        Ok(GetPromptResult {
            description: Some(format!("Select files in {} for a task", path)),
            messages,
        })
    }
}

#[tool_handler(router = self.tool_router)]
#[prompt_handler]
impl ServerHandler for AutoselectMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "autoselect".into(),
                title: Some("Project Autoselect - Task-Relevant File Selection".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Selects the files an LLM needs for a coding task. \
                Use select_files with the project's file list and a task description, \
                extract_symbols for per-file codemaps, and refresh_file after editing a file."
                    .into(),
            ),
        }
    }
}

impl AutoselectMcpServer {
    pub async fn serve_stdio() -> Result<()> {
        tracing::info!("Starting autoselect MCP server");

        let server = Self::new().await.context("Failed to create MCP server")?;

        let transport = rmcp::transport::io::stdio();

        server.serve(transport).await?.waiting().await?;

        Ok(())
    }
}
