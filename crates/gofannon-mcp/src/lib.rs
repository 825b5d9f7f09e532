//! MCP (Model Context Protocol) client core for Gofannon.
//!
//! This crate connects to MCP servers over stdio, SSE, or streamable
//! HTTP, runs the initialization handshake, and exposes the six
//! capability operations (`tools/list`, `tools/call`, `resources/list`,
//! `resources/read`, `prompts/list`, `prompts/get`) through a session
//! manager that handles caching and connection reuse.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SessionManager                                             │
//! │  - One per configured server                                │
//! │  - Capability caches (tools/resources/prompts)              │
//! │  - Persistent mode: single reused session behind a fair     │
//! │    async mutex; non-persistent: fresh connection per call   │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  LiveSession                                                │
//! │  - initialize / notifications-initialized handshake         │
//! │  - Request id allocation and response correlation           │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpTransport                                               │
//! │  - Stdio: child process, Content-Length framed JSON-RPC,    │
//! │    stderr wired from an explicit StderrSink                 │
//! │  - Sse: GET event stream + server-announced POST endpoint   │
//! │  - Http: streamable HTTP, one POST per request              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gofannon_mcp::{ServerDescriptor, SessionManager};
//!
//! let descriptor = ServerDescriptor::stdio("sqlite", "mcp-server-sqlite")
//!     .with_arg("--db")
//!     .with_arg("/path/to/database.db")
//!     .with_persistent(true);
//!
//! let manager = SessionManager::new(descriptor)?;
//!
//! let tools = manager.get_tools(false).await?;
//! for tool in &tools {
//!     println!("Tool: {} - {:?}", tool.name, tool.description);
//! }
//!
//! let result = manager
//!     .call_tool("query", Some(json!({"sql": "SELECT * FROM users"})))
//!     .await?;
//! println!("Result: {:?}", result.text());
//!
//! manager.close().await;
//! ```
//!
//! # Wire format
//!
//! Stdio servers speak JSON-RPC 2.0 with Content-Length framing:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! {"jsonrpc": "2.0", "id": 1, "method": "...", "params": {...}}
//! ```
//!
//! The protocol flow is:
//! 1. Client sends `initialize` with capabilities
//! 2. Server responds with its capabilities
//! 3. Client sends `notifications/initialized`
//! 4. Client can now use the capability operations

pub mod descriptor;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod session;
pub mod stderr;
pub mod transport;

// Re-export main types
pub use descriptor::{ServerDescriptor, StderrMode, TransportKind, DEFAULT_TIMEOUT_SECS};
pub use error::{McpError, Result};
pub use filter::ToolFilter;
pub use protocol::{
    CallToolParams, CallToolResult, GetPromptParams, GetPromptResult, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListPromptsResult, ListResourcesResult, ListToolsResult, PromptArgument, PromptInfo,
    PromptMessage, ReadResourceParams, ReadResourceResult, ResourceContents, ResourceInfo,
    ServerCapabilities, ServerInfo, ToolContent, ToolInfo, MCP_PROTOCOL_VERSION,
};
pub use session::{CapabilitySummary, LiveSession, SessionManager};
pub use stderr::StderrSink;
pub use transport::McpTransport;
