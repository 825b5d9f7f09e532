//! A single tool bound for host invocation.
//!
//! The host hands tool output straight to a language model, so
//! `invoke` never returns an error: every failure is rendered into the
//! output string and the model decides what to do with it.

use std::sync::Arc;

use serde_json::Value;

use gofannon_mcp::{CallToolResult, SessionManager, ToolContent, ToolInfo};

/// One remote tool, bound to the session manager of the server that
/// exposes it.
#[derive(Clone)]
pub struct ToolBinding {
    manager: Arc<SessionManager>,
    tool: ToolInfo,
}

impl ToolBinding {
    pub(crate) fn new(manager: Arc<SessionManager>, tool: ToolInfo) -> Self {
        Self { manager, tool }
    }

    /// The tool's name as the server declared it.
    pub fn name(&self) -> &str {
        &self.tool.name
    }

    /// The server this tool belongs to.
    pub fn server(&self) -> &str {
        self.manager.name()
    }

    /// Description for the host's tool registry. Servers may omit the
    /// description; fall back to something identifiable.
    pub fn description(&self) -> String {
        self.tool
            .description
            .clone()
            .unwrap_or_else(|| format!("MCP tool: {}", self.tool.name))
    }

    /// JSON Schema for the tool's arguments. Absent schemas become the
    /// empty object schema, which hosts treat as "no arguments".
    pub fn input_schema(&self) -> Value {
        self.tool
            .input_schema
            .clone()
            .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}}))
    }

    /// Invoke the tool and render its result as text.
    ///
    /// Transport failures, server errors, and tool-level errors all come
    /// back as an `Error: ...` string rather than propagating, so a
    /// single broken tool call cannot take down the host's conversation
    /// loop.
    pub async fn invoke(&self, arguments: Value) -> String {
        let arguments = if arguments.is_null() {
            None
        } else {
            Some(arguments)
        };

        match self.manager.call_tool(&self.tool.name, arguments).await {
            Ok(result) => {
                let rendered = render_result(&result);
                if result.is_error() {
                    tracing::warn!(
                        server = %self.manager.name(),
                        tool = %self.tool.name,
                        "tool reported an error"
                    );
                    format!("Error: {}", rendered)
                } else {
                    rendered
                }
            }
            Err(e) => {
                tracing::warn!(
                    server = %self.manager.name(),
                    tool = %self.tool.name,
                    error = %e,
                    "tool invocation failed"
                );
                format!("Error: {}", e)
            }
        }
    }
}

impl std::fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBinding")
            .field("server", &self.manager.name())
            .field("tool", &self.tool.name)
            .finish()
    }
}

/// Render a tool result for the model.
///
/// Structured content wins when present and is pretty-printed JSON.
/// Otherwise content items are rendered in order: text verbatim, images
/// and resources as bracketed placeholders.
pub fn render_result(result: &CallToolResult) -> String {
    if let Some(structured) = &result.structured_content {
        return serde_json::to_string_pretty(structured)
            .unwrap_or_else(|_| structured.to_string());
    }

    let mut parts = Vec::new();
    for item in &result.content {
        match item {
            ToolContent::Text { text } => parts.push(text.clone()),
            ToolContent::Image { mime_type, .. } => {
                parts.push(format!("[Image: {}]", mime_type));
            }
            ToolContent::Resource { uri, text, .. } => match text {
                Some(text) => parts.push(format!("[Resource {}]: {}", uri, text)),
                None => parts.push(format!("[Resource {}]", uri)),
            },
        }
    }

    if parts.is_empty() {
        "Tool executed successfully (no output)".to_string()
    } else {
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(content: Vec<ToolContent>) -> CallToolResult {
        CallToolResult {
            content,
            structured_content: None,
            is_error: None,
        }
    }

    #[test]
    fn test_render_text_verbatim() {
        let result = result_with(vec![ToolContent::Text {
            text: "plain output".to_string(),
        }]);
        assert_eq!(render_result(&result), "plain output");
    }

    #[test]
    fn test_render_structured_wins() {
        let result = CallToolResult {
            content: vec![ToolContent::Text {
                text: "ignored".to_string(),
            }],
            structured_content: Some(serde_json::json!({"rows": 3})),
            is_error: None,
        };
        let rendered = render_result(&result);
        assert!(rendered.contains("\"rows\": 3"));
        assert!(!rendered.contains("ignored"));
    }

    #[test]
    fn test_render_image_placeholder() {
        let result = result_with(vec![ToolContent::Image {
            data: "aGVsbG8=".to_string(),
            mime_type: "image/png".to_string(),
        }]);
        assert_eq!(render_result(&result), "[Image: image/png]");
    }

    #[test]
    fn test_render_resource_with_and_without_text() {
        let result = result_with(vec![
            ToolContent::Resource {
                uri: "file:///a.txt".to_string(),
                text: Some("contents".to_string()),
                mime_type: None,
            },
            ToolContent::Resource {
                uri: "file:///b.bin".to_string(),
                text: None,
                mime_type: Some("application/octet-stream".to_string()),
            },
        ]);
        assert_eq!(
            render_result(&result),
            "[Resource file:///a.txt]: contents\n[Resource file:///b.bin]"
        );
    }

    #[test]
    fn test_render_empty_result() {
        let result = result_with(Vec::new());
        assert_eq!(
            render_result(&result),
            "Tool executed successfully (no output)"
        );
    }

    #[test]
    fn test_render_mixed_content_joined_with_newlines() {
        let result = result_with(vec![
            ToolContent::Text {
                text: "first".to_string(),
            },
            ToolContent::Text {
                text: "second".to_string(),
            },
        ]);
        assert_eq!(render_result(&result), "first\nsecond");
    }
}
