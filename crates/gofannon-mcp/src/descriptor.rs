//! Server descriptors: immutable configuration for one MCP server.
//!
//! A descriptor names the server, picks a transport, and carries the
//! per-transport parameters. Validation runs before any connection
//! attempt; the invariants are "exactly one of command/url, matching the
//! transport" and "stderr_file present iff stderr_mode is file".

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{McpError, Result};

/// Default connect/handshake timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transport kind for an MCP server connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawn a child process and speak over its stdin/stdout.
    #[default]
    Stdio,
    /// Server-sent event stream with a paired POST endpoint.
    Sse,
    /// Bidirectional streamable HTTP.
    Http,
}

impl TransportKind {
    /// Lowercase name as it appears in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::Http => "http",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a stdio subprocess's stderr goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrMode {
    /// Discard stderr entirely.
    #[default]
    Disable,
    /// Redirect stderr to `stderr_file`.
    File,
    /// Let stderr pass through to the controlling terminal.
    Terminal,
}

/// Immutable configuration for one MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDescriptor {
    /// Unique name. Not stored inside the persisted record — it is the
    /// mapping key in the configuration document and is re-attached on
    /// load.
    #[serde(skip)]
    pub name: String,

    /// Transport kind.
    pub transport: TransportKind,

    /// Command to spawn (stdio transport).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments to pass to the command.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables merged over the inherited environment.
    /// Descriptor keys win on conflict.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Server URL (sse/http transports).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP headers attached to every request (sse/http transports).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Connect/handshake timeout in seconds.
    pub timeout_secs: u64,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// If set, only tools named here are exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_filter_include: Option<Vec<String>>,

    /// Tools named here are never exposed, even when included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_filter_exclude: Option<Vec<String>>,

    /// Stderr handling for the spawned subprocess.
    pub stderr_mode: StderrMode,

    /// Redirect target when `stderr_mode` is `File`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_file: Option<PathBuf>,

    /// Append to `stderr_file` instead of truncating it.
    pub stderr_append: bool,

    /// Keep one session open across calls instead of reconnecting per
    /// call.
    pub persistent: bool,
}

impl Default for ServerDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            transport: TransportKind::Stdio,
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            url: None,
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            description: None,
            tool_filter_include: None,
            tool_filter_exclude: None,
            stderr_mode: StderrMode::Disable,
            stderr_file: None,
            stderr_append: false,
            persistent: false,
        }
    }
}

impl ServerDescriptor {
    /// Create a descriptor for a stdio server.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Stdio,
            command: Some(command.into()),
            ..Default::default()
        }
    }

    /// Create a descriptor for an SSE server.
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Sse,
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Create a descriptor for a streamable HTTP server.
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Http,
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Add a command argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the command arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Add an environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add an HTTP header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the connect/handshake timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict the exposed tools to the given names.
    pub fn with_include_filter(mut self, names: Vec<String>) -> Self {
        self.tool_filter_include = Some(names);
        self
    }

    /// Exclude the given tool names.
    pub fn with_exclude_filter(mut self, names: Vec<String>) -> Self {
        self.tool_filter_exclude = Some(names);
        self
    }

    /// Redirect the subprocess's stderr to a file.
    pub fn with_stderr_file(mut self, path: impl Into<PathBuf>, append: bool) -> Self {
        self.stderr_mode = StderrMode::File;
        self.stderr_file = Some(path.into());
        self.stderr_append = append;
        self
    }

    /// Keep one session open across calls.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Connect/handshake timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the required fields for the configured transport are
    /// present. Runs before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(McpError::config("server name must not be empty"));
        }

        match self.transport {
            TransportKind::Stdio => {
                if self.command.as_deref().unwrap_or("").is_empty() {
                    return Err(McpError::config(format!(
                        "server '{}': command is required for stdio transport",
                        self.name
                    )));
                }
            }
            TransportKind::Sse | TransportKind::Http => {
                if self.url.as_deref().unwrap_or("").is_empty() {
                    return Err(McpError::config(format!(
                        "server '{}': url is required for {} transport",
                        self.name, self.transport
                    )));
                }
            }
        }

        if self.stderr_mode == StderrMode::File && self.stderr_file.is_none() {
            return Err(McpError::config(format!(
                "server '{}': stderr_file is required when stderr_mode is 'file'",
                self.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_descriptor_valid() {
        let d = ServerDescriptor::stdio("sqlite", "mcp-server-sqlite")
            .with_arg("--db")
            .with_arg("/tmp/db.sqlite")
            .with_env_var("DEBUG", "1");
        d.validate().unwrap();
        assert_eq!(d.args, vec!["--db", "/tmp/db.sqlite"]);
        assert_eq!(d.env.get("DEBUG").map(String::as_str), Some("1"));
        assert_eq!(d.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_stdio_missing_command_fails() {
        let d = ServerDescriptor {
            name: "broken".to_string(),
            transport: TransportKind::Stdio,
            ..Default::default()
        };
        let err = d.validate().unwrap_err();
        assert!(matches!(err, McpError::Config(_)));
        assert!(err.to_string().contains("command"));
    }

    #[test]
    fn test_network_missing_url_fails() {
        for transport in [TransportKind::Sse, TransportKind::Http] {
            let d = ServerDescriptor {
                name: "broken".to_string(),
                transport,
                ..Default::default()
            };
            let err = d.validate().unwrap_err();
            assert!(matches!(err, McpError::Config(_)));
            assert!(err.to_string().contains("url"));
        }
    }

    #[test]
    fn test_network_descriptors_valid() {
        ServerDescriptor::sse("remote", "https://mcp.example.com/sse")
            .with_header("Authorization", "Bearer token")
            .validate()
            .unwrap();
        ServerDescriptor::http("remote", "https://mcp.example.com/mcp")
            .validate()
            .unwrap();
    }

    #[test]
    fn test_stderr_file_mode_requires_path() {
        let mut d = ServerDescriptor::stdio("test", "cmd");
        d.stderr_mode = StderrMode::File;
        let err = d.validate().unwrap_err();
        assert!(matches!(err, McpError::Config(_)));
        assert!(err.to_string().contains("stderr_file"));

        let d = ServerDescriptor::stdio("test", "cmd").with_stderr_file("/tmp/server.log", true);
        d.validate().unwrap();
    }

    #[test]
    fn test_empty_name_fails() {
        let d = ServerDescriptor::stdio("", "cmd");
        assert!(matches!(d.validate(), Err(McpError::Config(_))));
    }

    #[test]
    fn test_serde_round_trip_excludes_name() {
        let d = ServerDescriptor::stdio("notion", "uvx")
            .with_arg("mcp-server-notion")
            .with_timeout_secs(60)
            .with_persistent(true);

        let json = serde_json::to_string(&d).unwrap();
        // Name is the mapping key in the stored document, never a field.
        assert!(!json.contains("notion"));
        assert!(json.contains("\"persistent\":true"));

        let mut restored: ServerDescriptor = serde_json::from_str(&json).unwrap();
        restored.name = "notion".to_string();
        restored.validate().unwrap();
        assert_eq!(restored.timeout_secs, 60);
        assert!(restored.persistent);
    }

    #[test]
    fn test_deserialize_defaults() {
        let d: ServerDescriptor =
            serde_json::from_str(r#"{"transport": "stdio", "command": "cat"}"#).unwrap();
        assert_eq!(d.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(d.stderr_mode, StderrMode::Disable);
        assert!(!d.persistent);
        assert!(!d.stderr_append);
    }
}
