//! One server's worth of bound tools.

use std::sync::Arc;

use gofannon_mcp::{
    CapabilitySummary, GetPromptResult, ReadResourceResult, Result, ServerDescriptor,
    SessionManager, ToolFilter,
};
use serde_json::Value;

use crate::binding::ToolBinding;

/// Wraps a configured server and exposes its tools as host-callable
/// bindings, with the descriptor's include/exclude filter applied.
pub struct Toolbox {
    manager: Arc<SessionManager>,
    filter: ToolFilter,
}

impl Toolbox {
    /// Build a toolbox from a descriptor. Fails on an invalid
    /// descriptor; no connection happens until the first operation.
    pub fn new(descriptor: ServerDescriptor) -> Result<Self> {
        let filter = ToolFilter::from_descriptor(&descriptor);
        let manager = Arc::new(SessionManager::new(descriptor)?);
        Ok(Self { manager, filter })
    }

    /// The configured server name.
    pub fn name(&self) -> &str {
        self.manager.name()
    }

    /// Description shown in tool listings.
    pub fn description(&self) -> String {
        let descriptor = self.manager.descriptor();
        descriptor.description.clone().unwrap_or_else(|| {
            format!(
                "MCP server '{}' ({})",
                descriptor.name, descriptor.transport
            )
        })
    }

    /// The underlying session manager, for callers that need the raw
    /// capability operations.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Discover the server's tools and return a binding for each one
    /// that survives the filter.
    ///
    /// The returned bindings are a snapshot: tools added or removed on
    /// the server after this call are not reflected until `bind` runs
    /// again.
    pub async fn bind(&self, force_refresh: bool) -> Result<Vec<ToolBinding>> {
        let tools = self.manager.get_tools(force_refresh).await?;
        let exposed = self.filter.apply(&tools);

        if !self.filter.is_identity() {
            tracing::debug!(
                server = %self.manager.name(),
                discovered = tools.len(),
                exposed = exposed.len(),
                "tool filter applied"
            );
        }

        Ok(exposed
            .into_iter()
            .map(|tool| ToolBinding::new(Arc::clone(&self.manager), tool))
            .collect())
    }

    /// Everything the server exposes. The tool list reflects the
    /// filter; resources and prompts are never filtered.
    pub async fn list_capabilities(&self, force_refresh: bool) -> Result<CapabilitySummary> {
        let mut summary = self.manager.list_capabilities(force_refresh).await?;
        summary.tools = self.filter.apply(&summary.tools);
        Ok(summary)
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.manager.read_resource(uri).await
    }

    /// Render a prompt by name.
    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> Result<GetPromptResult> {
        self.manager.get_prompt(name, arguments).await
    }

    /// Drop cached capability lists.
    pub fn clear_cache(&self) {
        self.manager.clear_cache();
    }

    /// Close any persistent session. Idempotent.
    pub async fn close(&self) {
        self.manager.close().await;
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("server", &self.manager.name())
            .finish()
    }
}
