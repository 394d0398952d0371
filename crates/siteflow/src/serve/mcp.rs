//! MCP (Model Context Protocol) server for Siteflow.
//!
//! Exposes each tool of the [`Toolbox`] as an MCP tool over stdio. Client calls
//! block on HTTP, so they run on the blocking thread pool.

use crate::tools::{
    AddPhaseRequest, AddStepRequest, CreateFlowRequest, FlowPhasesRequest, Toolbox,
    UpdateStepTextRequest,
};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, ServiceExt, tool, tool_handler, tool_router};
use tracing::{error, info};

/// MCP server over a shared toolbox.
#[derive(Clone)]
pub struct SiteflowServer {
    toolbox: Toolbox,
    tool_router: ToolRouter<Self>,
}

impl SiteflowServer {
    /// Run a tool off the async runtime and wrap its text.
    async fn run<F>(&self, call: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&Toolbox) -> String + Send + 'static,
    {
        let toolbox = self.toolbox.clone();
        let text = tokio::task::spawn_blocking(move || call(&toolbox))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "tool task panicked");
                format!("Task panicked: {}", e)
            });
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_router]
impl SiteflowServer {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Authenticate with the Siteflow API.")]
    async fn authenticate(&self) -> Result<CallToolResult, McpError> {
        self.run(|tools| tools.authenticate()).await
    }

    #[tool(description = "Get all available flows for the configured project.")]
    async fn get_flows(&self) -> Result<CallToolResult, McpError> {
        self.run(|tools| tools.get_flows()).await
    }

    #[tool(description = "Get phases for a specific flow.")]
    async fn get_flow_phases(
        &self,
        Parameters(req): Parameters<FlowPhasesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.get_flow_phases(&req)).await
    }

    #[tool(description = "Add a new phase to a flow.")]
    async fn add_phase_to_flow(
        &self,
        Parameters(req): Parameters<AddPhaseRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.add_phase_to_flow(&req)).await
    }

    #[tool(description = "Add a new step to a phase.")]
    async fn add_step_to_phase(
        &self,
        Parameters(req): Parameters<AddStepRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.add_step_to_phase(&req)).await
    }

    #[tool(description = "Create a new flow.")]
    async fn create_flow(
        &self,
        Parameters(req): Parameters<CreateFlowRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.create_flow(&req)).await
    }

    #[tool(description = "Update the text block of a step. The text may include HTML.")]
    async fn update_step_text(
        &self,
        Parameters(req): Parameters<UpdateStepTextRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.update_step_text(&req)).await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for SiteflowServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Manage Siteflow workflows: list flows and phases, create flows, add phases and steps, update step text."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve the toolbox over stdio until the client disconnects.
pub async fn run_server(toolbox: Toolbox) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("starting MCP server on stdio");
    let service = SiteflowServer::new(toolbox).serve(stdio()).await?;
    service.waiting().await?;
    info!("MCP client disconnected");
    Ok(())
}

/// Command handler for `siteflow-mcp serve`.
pub fn cmd_serve_mcp(toolbox: Toolbox) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return 1;
        }
    };

    match rt.block_on(run_server(toolbox)) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "MCP server error");
            eprintln!("MCP server error: {}", e);
            1
        }
    }
}
