//! Persistent MCP server configuration for Gofannon.
//!
//! Servers are stored in a single JSON document under the user's config
//! directory (`~/.config/gofannon/mcp_servers.json` on Linux), keyed by
//! server name. The stored records are [`gofannon_mcp::ServerDescriptor`]s
//! minus the name, which lives in the mapping key.

pub mod error;
pub mod store;

pub use error::{ConfigError, Result};
pub use store::ServersFile;
