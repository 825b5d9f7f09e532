//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading and saving server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a config file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse or serialize the config document.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The stored descriptor failed validation.
    #[error(transparent)]
    Descriptor(#[from] gofannon_mcp::McpError),

    /// No server with that name is configured.
    #[error("server '{0}' not found")]
    NotFound(String),

    /// A server with that name is already configured.
    #[error("server '{0}' already exists (use --force to replace it)")]
    AlreadyExists(String),

    /// Could not determine the user's config directory.
    #[error("could not determine the user config directory")]
    NoConfigDir,
}
