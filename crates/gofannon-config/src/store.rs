//! The on-disk server registry.
//!
//! Stored as a single JSON document mapping server name to descriptor:
//!
//! ```json
//! {
//!   "sqlite": {
//!     "transport": "stdio",
//!     "command": "mcp-server-sqlite",
//!     "args": ["--db", "/data/app.db"],
//!     "timeout_secs": 30,
//!     ...
//!   }
//! }
//! ```
//!
//! The name lives only in the mapping key; it is re-attached to each
//! descriptor on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use gofannon_mcp::ServerDescriptor;

use crate::error::{ConfigError, Result};

/// Default config filename.
const SERVERS_FILE: &str = "mcp_servers.json";

/// The set of configured servers, as persisted on disk.
#[derive(Debug, Clone, Default)]
pub struct ServersFile {
    servers: BTreeMap<String, ServerDescriptor>,
}

impl ServersFile {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the default config file:
    /// `<user config dir>/gofannon/mcp_servers.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("gofannon").join(SERVERS_FILE))
    }

    /// Load from the default path. A missing file is an empty registry,
    /// not an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path. A missing file is an empty registry.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;

        let document: BTreeMap<String, Value> = serde_json::from_str(&raw)?;

        let mut servers = BTreeMap::new();
        for (name, record) in document {
            let mut descriptor: ServerDescriptor = serde_json::from_value(record)?;
            descriptor.name = name.clone();
            servers.insert(name, descriptor);
        }

        Ok(Self { servers })
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFile {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        // The descriptor's own serialization skips the name field, so
        // the mapping key is the single source of truth.
        let json = serde_json::to_string_pretty(&self.servers)?;

        std::fs::write(path, json).map_err(|source| ConfigError::WriteFile {
            path: path.display().to_string(),
            source,
        })
    }

    /// Add a server. The descriptor is validated first; an existing
    /// entry with the same name is only replaced when `overwrite` is
    /// set.
    pub fn add(&mut self, descriptor: ServerDescriptor, overwrite: bool) -> Result<()> {
        descriptor.validate()?;
        if !overwrite && self.servers.contains_key(&descriptor.name) {
            return Err(ConfigError::AlreadyExists(descriptor.name));
        }
        self.servers.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Remove a server by name, returning its descriptor.
    pub fn remove(&mut self, name: &str) -> Result<ServerDescriptor> {
        self.servers
            .remove(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Look up a server by name.
    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.get(name)
    }

    /// Look up a server by name, erroring when absent.
    pub fn require(&self, name: &str) -> Result<&ServerDescriptor> {
        self.get(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Names of all configured servers, in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Iterate over all configured servers.
    pub fn iter(&self) -> impl Iterator<Item = &ServerDescriptor> {
        self.servers.values()
    }

    /// Number of configured servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// True when no servers are configured.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
