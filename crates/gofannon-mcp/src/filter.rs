//! Include/exclude filtering of discovered tool names.
//!
//! The filter is applied to the discovered tool set before it is exposed
//! to the host binding layer. It never mutates the underlying cache:
//! `apply` returns a filtered copy. Include narrows first, exclude then
//! removes regardless of the include result.

use crate::descriptor::ServerDescriptor;
use crate::protocol::ToolInfo;

/// Tool name filter derived from a descriptor's include/exclude lists.
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl ToolFilter {
    /// Build a filter from a descriptor. Absent lists mean no filtering.
    pub fn from_descriptor(descriptor: &ServerDescriptor) -> Self {
        Self {
            include: descriptor.tool_filter_include.clone(),
            exclude: descriptor.tool_filter_exclude.clone(),
        }
    }

    /// True when neither list is set.
    pub fn is_identity(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    /// Whether a tool with the given name survives the filter.
    pub fn allows(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.iter().any(|n| n == name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|n| n == name) {
                return false;
            }
        }
        true
    }

    /// Return the tools that survive the filter, in their original order.
    pub fn apply(&self, tools: &[ToolInfo]) -> Vec<ToolInfo> {
        tools
            .iter()
            .filter(|t| self.allows(&t.name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolInfo {
        ToolInfo {
            name: name.to_string(),
            description: None,
            input_schema: None,
        }
    }

    fn names(tools: &[ToolInfo]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_no_filter_is_identity() {
        let filter = ToolFilter::default();
        assert!(filter.is_identity());

        let tools = vec![tool("a"), tool("b")];
        assert_eq!(names(&filter.apply(&tools)), vec!["a", "b"]);
    }

    #[test]
    fn test_include_narrows() {
        let filter = ToolFilter {
            include: Some(vec!["a".to_string(), "c".to_string()]),
            exclude: None,
        };
        let tools = vec![tool("a"), tool("b"), tool("c"), tool("d")];
        assert_eq!(names(&filter.apply(&tools)), vec!["a", "c"]);
    }

    #[test]
    fn test_exclude_removes() {
        let filter = ToolFilter {
            include: None,
            exclude: Some(vec!["b".to_string()]),
        };
        let tools = vec![tool("a"), tool("b"), tool("c")];
        assert_eq!(names(&filter.apply(&tools)), vec!["a", "c"]);
    }

    #[test]
    fn test_include_then_exclude_ordering() {
        // include={a,b,c}, exclude={b}, input {a,b,c,d} -> exactly {a,c}
        let filter = ToolFilter {
            include: Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            exclude: Some(vec!["b".to_string()]),
        };
        let tools = vec![tool("a"), tool("b"), tool("c"), tool("d")];
        assert_eq!(names(&filter.apply(&tools)), vec!["a", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let filter = ToolFilter {
            include: Some(vec!["a".to_string(), "b".to_string()]),
            exclude: Some(vec!["b".to_string()]),
        };
        let tools = vec![tool("a"), tool("b"), tool("c")];
        let once = filter.apply(&tools);
        let twice = filter.apply(&once);
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn test_does_not_mutate_input() {
        let filter = ToolFilter {
            include: Some(vec!["a".to_string()]),
            exclude: None,
        };
        let tools = vec![tool("a"), tool("b")];
        let _ = filter.apply(&tools);
        assert_eq!(tools.len(), 2);
    }

    #[test]
    fn test_empty_include_blocks_everything() {
        // An explicitly empty include list exposes nothing.
        let filter = ToolFilter {
            include: Some(Vec::new()),
            exclude: None,
        };
        assert!(!filter.allows("a"));
    }
}
