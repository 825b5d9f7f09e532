//! Registry of open toolboxes, keyed by server name.
//!
//! Hosts typically build tool sets lazily and repeatedly (once per
//! conversation turn); the registry makes repeated lookups cheap by
//! keeping one [`Toolbox`] per server. It is an ordinary value the
//! caller owns and passes around, with no process-wide state behind it.

use std::collections::HashMap;
use std::sync::Arc;

use gofannon_mcp::{Result, ServerDescriptor};

use crate::toolbox::Toolbox;

/// Owns one [`Toolbox`] per server.
#[derive(Default)]
pub struct ToolboxRegistry {
    open: tokio::sync::Mutex<HashMap<String, Arc<Toolbox>>>,
}

impl ToolboxRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the toolbox for a descriptor, creating it on first use.
    /// Lookups after the first are keyed by name and ignore any changes
    /// to the descriptor; call [`clear`](Self::clear) to pick up edits.
    pub async fn get(&self, descriptor: &ServerDescriptor) -> Result<Arc<Toolbox>> {
        let mut open = self.open.lock().await;
        if let Some(toolbox) = open.get(&descriptor.name) {
            return Ok(Arc::clone(toolbox));
        }

        let toolbox = Arc::new(Toolbox::new(descriptor.clone())?);
        open.insert(descriptor.name.clone(), Arc::clone(&toolbox));
        tracing::debug!(server = %descriptor.name, "toolbox registered");
        Ok(toolbox)
    }

    /// Names of the currently open toolboxes.
    pub async fn names(&self) -> Vec<String> {
        let open = self.open.lock().await;
        let mut names: Vec<String> = open.keys().cloned().collect();
        names.sort();
        names
    }

    /// Close every open toolbox's sessions and empty the registry.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Toolbox>> = {
            let mut open = self.open.lock().await;
            open.drain().map(|(_, toolbox)| toolbox).collect()
        };
        for toolbox in drained {
            toolbox.close().await;
        }
    }

    /// Forget all open toolboxes without waiting for their sessions to
    /// close. Outstanding `Arc` holders keep their toolboxes working.
    pub async fn clear(&self) {
        self.open.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_reuses_by_name() {
        let registry = ToolboxRegistry::new();
        let descriptor = ServerDescriptor::stdio("files", "mcp-files");

        let a = registry.get(&descriptor).await.unwrap();
        let b = registry.get(&descriptor).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.names().await, vec!["files"]);
    }

    #[tokio::test]
    async fn test_clear_forces_rebuild() {
        let registry = ToolboxRegistry::new();
        let descriptor = ServerDescriptor::stdio("files", "mcp-files");

        let a = registry.get(&descriptor).await.unwrap();
        registry.clear().await;
        let b = registry.get(&descriptor).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_close_all_empties_registry() {
        let registry = ToolboxRegistry::new();
        registry
            .get(&ServerDescriptor::stdio("one", "cmd-one"))
            .await
            .unwrap();
        registry
            .get(&ServerDescriptor::stdio("two", "cmd-two"))
            .await
            .unwrap();

        registry.close_all().await;
        assert!(registry.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_descriptor_not_registered() {
        let registry = ToolboxRegistry::new();
        let broken = ServerDescriptor {
            name: "broken".to_string(),
            ..Default::default()
        };
        assert!(registry.get(&broken).await.is_err());
        assert!(registry.names().await.is_empty());
    }
}
