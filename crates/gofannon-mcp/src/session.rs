//! Session management: connection lifecycle, capability caching, and
//! the persistent-session gate.
//!
//! A [`SessionManager`] owns everything about one configured server. In
//! the default non-persistent mode every operation opens a fresh
//! connection, performs one request, and tears the connection down. In
//! persistent mode one live session is kept behind an async mutex and
//! reused; the lock is acquired in FIFO order, so concurrent callers
//! serialize fairly and a caller that is cancelled while waiting simply
//! leaves the queue.
//!
//! Capability lists (tools, resources, prompts) are cached after the
//! first fetch. An unfetched cache is distinct from a cached empty
//! list: `None` means "never asked", `Some(vec![])` means "asked, the
//! server has none (or does not implement the method)".

use serde_json::Value;

use crate::descriptor::ServerDescriptor;
use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, InitializeParams,
    InitializeResult, JsonRpcNotification, JsonRpcRequest, ListPromptsResult, ListResourcesResult,
    ListToolsResult, PromptInfo, ReadResourceParams, ReadResourceResult, ResourceInfo, ServerInfo,
    ToolInfo, MCP_PROTOCOL_VERSION,
};
use crate::stderr::StderrSink;
use crate::transport::McpTransport;

/// One live, initialized connection to an MCP server.
pub struct LiveSession {
    transport: McpTransport,
    #[allow(dead_code)]
    sink: StderrSink,
    server_info: ServerInfo,
    next_id: u64,
}

impl LiveSession {
    /// Connect and run the initialization handshake. The whole sequence
    /// (including a subprocess spawn or network connect) must finish
    /// within the descriptor's timeout.
    pub async fn open(descriptor: &ServerDescriptor) -> Result<Self> {
        let connect = async {
            let sink = StderrSink::resolve(descriptor);
            let mut transport = McpTransport::open(descriptor, &sink).await?;
            let server_info = Self::handshake(&mut transport, descriptor).await?;
            Ok::<_, McpError>(Self {
                transport,
                sink,
                server_info,
                // Id 1 was consumed by initialize.
                next_id: 2,
            })
        };

        tokio::time::timeout(descriptor.timeout(), connect)
            .await
            .map_err(|_| McpError::Timeout)?
    }

    /// `initialize` request followed by the `notifications/initialized`
    /// notification.
    async fn handshake(
        transport: &mut McpTransport,
        descriptor: &ServerDescriptor,
    ) -> Result<ServerInfo> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let request = JsonRpcRequest::new(1, "initialize", Some(params));
        let response = transport.send_request(&request).await?;
        let result = response
            .into_result()
            .map_err(|e| McpError::server_error(e.code, e.message, e.data))?;
        let init: InitializeResult = serde_json::from_value(result)?;

        if init.protocol_version != MCP_PROTOCOL_VERSION {
            tracing::debug!(
                server = %descriptor.name,
                advertised = %init.protocol_version,
                requested = MCP_PROTOCOL_VERSION,
                "server advertised a different protocol version"
            );
        }

        transport
            .send_notification(&JsonRpcNotification::new("notifications/initialized", None))
            .await?;

        tracing::debug!(
            server = %descriptor.name,
            server_name = %init.server_info.name,
            server_version = %init.server_info.version,
            "MCP handshake complete"
        );

        Ok(init.server_info)
    }

    /// Information the server reported about itself during the handshake.
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Send one request and decode the result payload. Server error
    /// responses become [`McpError::ServerError`].
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        let response = self.transport.send_request(&request).await?;

        if response.id != id {
            return Err(McpError::protocol(format!(
                "response id {} does not match request id {}",
                response.id, id
            )));
        }

        response
            .into_result()
            .map_err(|e| McpError::server_error(e.code, e.message, e.data))
    }

    /// Tear the session down. The transport kill is best-effort and the
    /// stderr sink is released when the session drops.
    pub async fn close(mut self) {
        self.transport.shutdown().await;
    }
}

/// Cached capability lists. `None` means never fetched.
#[derive(Debug, Default)]
struct CapabilityCaches {
    tools: Option<Vec<ToolInfo>>,
    resources: Option<Vec<ResourceInfo>>,
    prompts: Option<Vec<PromptInfo>>,
}

/// Everything a server exposes, fetched in one pass.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySummary {
    /// Tools the server exposes.
    pub tools: Vec<ToolInfo>,
    /// Resources the server exposes.
    pub resources: Vec<ResourceInfo>,
    /// Prompts the server exposes.
    pub prompts: Vec<PromptInfo>,
}

/// Manages connections and capability caches for one configured server.
pub struct SessionManager {
    descriptor: ServerDescriptor,
    /// The single live session in persistent mode. The async mutex is
    /// fair: waiters are served in arrival order, and both session
    /// establishment and the request itself happen under the lock so a
    /// second caller can never race the handshake.
    persistent: tokio::sync::Mutex<Option<LiveSession>>,
    caches: parking_lot::Mutex<CapabilityCaches>,
}

impl SessionManager {
    /// Create a manager for a descriptor. Validation happens here, so a
    /// broken descriptor fails before any connection attempt.
    pub fn new(descriptor: ServerDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            descriptor,
            persistent: tokio::sync::Mutex::new(None),
            caches: parking_lot::Mutex::new(CapabilityCaches::default()),
        })
    }

    /// The descriptor this manager was built from.
    pub fn descriptor(&self) -> &ServerDescriptor {
        &self.descriptor
    }

    /// The configured server name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Route one request through the configured connection mode.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if self.descriptor.persistent {
            self.request_persistent(method, params).await
        } else {
            self.request_oneshot(method, params).await
        }
    }

    /// Persistent mode: establish the session on first use, then reuse
    /// it. A dead connection is evicted so the next caller reconnects.
    async fn request_persistent(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let mut guard = self.persistent.lock().await;

        if guard.is_none() {
            *guard = Some(LiveSession::open(&self.descriptor).await?);
        }

        let session = guard
            .as_mut()
            .ok_or(McpError::ConnectionClosed)?;

        let result = session.request(method, params).await;

        if let Err(e) = &result {
            if e.is_connection_dead() {
                tracing::warn!(
                    server = %self.descriptor.name,
                    error = %e,
                    "persistent session lost, will reconnect on next call"
                );
                if let Some(dead) = guard.take() {
                    dead.close().await;
                }
            }
        }

        result
    }

    /// Non-persistent mode: fresh connection, one request, teardown.
    async fn request_oneshot(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let mut session = LiveSession::open(&self.descriptor).await?;
        let result = session.request(method, params).await;
        session.close().await;
        result
    }

    /// List the server's tools, using the cache unless `force_refresh`
    /// is set. A server that does not implement `tools/list` yields an
    /// empty list, which is cached like any other answer.
    pub async fn get_tools(&self, force_refresh: bool) -> Result<Vec<ToolInfo>> {
        if !force_refresh {
            if let Some(tools) = &self.caches.lock().tools {
                return Ok(tools.clone());
            }
        }

        let tools = match self.request("tools/list", None).await {
            Ok(value) => serde_json::from_value::<ListToolsResult>(value)?.tools,
            Err(e) if e.is_method_not_found() => {
                tracing::debug!(server = %self.descriptor.name, "server does not support tools");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        self.caches.lock().tools = Some(tools.clone());
        Ok(tools)
    }

    /// List the server's resources, with the same caching and
    /// unsupported-method handling as [`get_tools`](Self::get_tools).
    pub async fn get_resources(&self, force_refresh: bool) -> Result<Vec<ResourceInfo>> {
        if !force_refresh {
            if let Some(resources) = &self.caches.lock().resources {
                return Ok(resources.clone());
            }
        }

        let resources = match self.request("resources/list", None).await {
            Ok(value) => serde_json::from_value::<ListResourcesResult>(value)?.resources,
            Err(e) if e.is_method_not_found() => {
                tracing::debug!(server = %self.descriptor.name, "server does not support resources");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        self.caches.lock().resources = Some(resources.clone());
        Ok(resources)
    }

    /// List the server's prompts, with the same caching and
    /// unsupported-method handling as [`get_tools`](Self::get_tools).
    pub async fn get_prompts(&self, force_refresh: bool) -> Result<Vec<PromptInfo>> {
        if !force_refresh {
            if let Some(prompts) = &self.caches.lock().prompts {
                return Ok(prompts.clone());
            }
        }

        let prompts = match self.request("prompts/list", None).await {
            Ok(value) => serde_json::from_value::<ListPromptsResult>(value)?.prompts,
            Err(e) if e.is_method_not_found() => {
                tracing::debug!(server = %self.descriptor.name, "server does not support prompts");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        self.caches.lock().prompts = Some(prompts.clone());
        Ok(prompts)
    }

    /// Fetch all three capability categories.
    pub async fn list_capabilities(&self, force_refresh: bool) -> Result<CapabilitySummary> {
        Ok(CapabilitySummary {
            tools: self.get_tools(force_refresh).await?,
            resources: self.get_resources(force_refresh).await?,
            prompts: self.get_prompts(force_refresh).await?,
        })
    }

    /// Invoke a tool. Always hits the server; tool results are never
    /// cached. A server without `tools/call` surfaces the error as-is.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        tracing::debug!(server = %self.descriptor.name, tool = %name, "calling tool");
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;
        let value = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Read a resource by URI. Always hits the server.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        tracing::debug!(server = %self.descriptor.name, uri = %uri, "reading resource");
        let params = serde_json::to_value(ReadResourceParams {
            uri: uri.to_string(),
        })?;
        let value = self.request("resources/read", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Render a prompt by name. Always hits the server.
    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> Result<GetPromptResult> {
        tracing::debug!(server = %self.descriptor.name, prompt = %name, "getting prompt");
        let params = serde_json::to_value(GetPromptParams {
            name: name.to_string(),
            arguments,
        })?;
        let value = self.request("prompts/get", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Drop all cached capability lists. The next list call re-queries
    /// the server.
    pub fn clear_cache(&self) {
        *self.caches.lock() = CapabilityCaches::default();
    }

    /// Close the persistent session if one is open. Safe to call any
    /// number of times, and a no-op in non-persistent mode.
    pub async fn close(&self) {
        let session = self.persistent.lock().await.take();
        if let Some(session) = session {
            tracing::debug!(server = %self.descriptor.name, "closing persistent session");
            session.close().await;
        }
    }
}
