//! CLI command handlers.

use std::path::PathBuf;

use anyhow::Result;

use gofannon_config::ServersFile;

pub mod add;
pub mod info;
pub mod list;
pub mod remove;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file path, when the default is overridden.
    pub config_path: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// The config file path in effect.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(ServersFile::default_path()?),
        }
    }

    /// Load the server registry from the path in effect.
    pub fn load_servers(&self) -> Result<ServersFile> {
        Ok(ServersFile::load_from(&self.config_path()?)?)
    }

    /// Save the server registry to the path in effect.
    pub fn save_servers(&self, servers: &ServersFile) -> Result<()> {
        servers.save_to(&self.config_path()?)?;
        Ok(())
    }
}
