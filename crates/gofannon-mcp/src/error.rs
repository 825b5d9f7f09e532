//! Error types for MCP operations.

use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Malformed or incomplete server descriptor. Raised at validation
    /// time, before any connection attempt.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to spawn the MCP server process.
    #[error("failed to spawn MCP server: {0}")]
    SpawnFailed(String),

    /// Failed to communicate with the MCP server.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned an error response.
    #[error("server error {code}: {message}")]
    ServerError {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Connect/handshake did not complete within the descriptor timeout.
    #[error("timed out waiting for the server")]
    Timeout,
}

impl McpError {
    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a spawn failed error.
    pub fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a server error from an error response.
    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
            data,
        }
    }

    /// True if the server rejected the request because the method is not
    /// implemented. The session manager treats this as "capability
    /// unsupported" and downgrades list operations to empty results.
    pub fn is_method_not_found(&self) -> bool {
        matches!(
            self,
            Self::ServerError {
                code: crate::protocol::JsonRpcError::METHOD_NOT_FOUND,
                ..
            }
        )
    }

    /// True if the error indicates the underlying connection is gone and
    /// a persistent session should be discarded.
    pub fn is_connection_dead(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Io(_))
    }
}
