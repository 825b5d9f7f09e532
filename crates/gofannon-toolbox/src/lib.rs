//! Host binding layer for Gofannon.
//!
//! Turns a configured MCP server into a set of callable tool bindings a
//! language-model host can register directly:
//!
//! - [`Toolbox`] wraps one server, applies its include/exclude tool
//!   filter, and hands out [`ToolBinding`]s.
//! - [`ToolBinding::invoke`] never fails: transport and tool errors are
//!   rendered into the output string so a broken tool cannot abort the
//!   host's conversation loop.
//! - [`ToolboxRegistry`] keeps one toolbox per server name so repeated
//!   binding passes stay cheap.
//!
//! ```rust,ignore
//! use gofannon_mcp::ServerDescriptor;
//! use gofannon_toolbox::ToolboxRegistry;
//!
//! let registry = ToolboxRegistry::new();
//! let descriptor = ServerDescriptor::stdio("sqlite", "mcp-server-sqlite");
//!
//! let toolbox = registry.get(&descriptor).await?;
//! for binding in toolbox.bind(false).await? {
//!     println!("{}: {}", binding.name(), binding.description());
//! }
//!
//! registry.close_all().await;
//! ```

pub mod binding;
pub mod registry;
pub mod toolbox;

pub use binding::{render_result, ToolBinding};
pub use registry::ToolboxRegistry;
pub use toolbox::Toolbox;
