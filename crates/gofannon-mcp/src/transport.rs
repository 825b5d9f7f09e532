//! Transport layer for MCP communication.
//!
//! Three transports produce the same framed JSON-RPC channel:
//!
//! - stdio: spawn a child process, Content-Length framed messages over
//!   its stdin/stdout, stderr wired from an explicit [`StderrSink`].
//! - sse: a GET stream of server-sent events paired with a POST endpoint
//!   announced by the server's first `endpoint` event.
//! - http: streamable HTTP, one POST per request; the response body is
//!   either a JSON object or a one-shot SSE body.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use url::Url;

use crate::descriptor::{ServerDescriptor, TransportKind};
use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::stderr::StderrSink;

/// Header carrying the server-assigned session id on streamable HTTP.
const MCP_SESSION_ID: &str = "Mcp-Session-Id";

/// Transport for communicating with an MCP server.
pub enum McpTransport {
    /// Child process over stdin/stdout.
    Stdio(StdioTransport),
    /// Server-sent event stream plus POST endpoint.
    Sse(SseTransport),
    /// Streamable HTTP.
    Http(HttpTransport),
}

impl McpTransport {
    /// Open the transport described by the descriptor. The descriptor
    /// must already be validated; the stderr sink is only consulted for
    /// stdio transports.
    pub async fn open(descriptor: &ServerDescriptor, sink: &StderrSink) -> Result<Self> {
        match descriptor.transport {
            TransportKind::Stdio => {
                let command = descriptor
                    .command
                    .as_deref()
                    .ok_or_else(|| McpError::config("command is required for stdio transport"))?;
                let transport =
                    StdioTransport::spawn(command, &descriptor.args, &descriptor.env, sink).await?;
                tracing::info!(
                    server = %descriptor.name,
                    command = %command,
                    "connected to MCP server via stdio"
                );
                Ok(Self::Stdio(transport))
            }
            TransportKind::Sse => {
                let url = descriptor
                    .url
                    .as_deref()
                    .ok_or_else(|| McpError::config("url is required for sse transport"))?;
                let transport = SseTransport::connect(url, &descriptor.headers).await?;
                tracing::info!(
                    server = %descriptor.name,
                    url = %url,
                    "connected to MCP server via SSE"
                );
                Ok(Self::Sse(transport))
            }
            TransportKind::Http => {
                let url = descriptor
                    .url
                    .as_deref()
                    .ok_or_else(|| McpError::config("url is required for http transport"))?;
                let transport = HttpTransport::connect(url, &descriptor.headers)?;
                tracing::info!(
                    server = %descriptor.name,
                    url = %url,
                    "connected to MCP server via HTTP"
                );
                Ok(Self::Http(transport))
            }
        }
    }

    /// Send a JSON-RPC request and wait for its response.
    pub async fn send_request(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        match self {
            Self::Stdio(t) => t.send_request(request).await,
            Self::Sse(t) => t.send_request(request).await,
            Self::Http(t) => t.send_request(request).await,
        }
    }

    /// Send a JSON-RPC notification (no response expected).
    pub async fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        match self {
            Self::Stdio(t) => t.send_notification(notification).await,
            Self::Sse(t) => t.send_notification(notification).await,
            Self::Http(t) => t.send_notification(notification).await,
        }
    }

    /// Shut the transport down. Idempotent; errors are swallowed because
    /// the peer may already be gone.
    pub async fn shutdown(&mut self) {
        if let Self::Stdio(t) = self {
            t.shutdown().await;
        }
        // Network transports hold no process; dropping the connection is
        // enough.
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stdio
// ─────────────────────────────────────────────────────────────────────────────

/// Child process speaking Content-Length framed JSON-RPC on stdin/stdout.
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StdioTransport {
    /// Spawn the server process. The descriptor environment is layered
    /// over the inherited environment (descriptor keys win), and stderr
    /// goes wherever the sink points.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        sink: &StderrSink,
    ) -> Result<Self> {
        let program = resolve_command(command);

        let mut cmd = Command::new(&program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(sink.as_stdio()?)
            .kill_on_drop(true);

        for (key, value) in env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            McpError::spawn_failed(format!("failed to spawn '{}': {}", command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdout"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn send_request(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.send_message(&serde_json::to_value(request)?).await?;
        self.receive_response().await
    }

    async fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        self.send_message(&serde_json::to_value(notification)?)
            .await
    }

    /// Write one Content-Length framed message.
    async fn send_message(&mut self, message: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_string(message)?;
        let frame = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
        self.stdin.write_all(frame.as_bytes()).await?;
        self.stdin.flush().await?;

        tracing::trace!(content_length = json.len(), json = %json, "sent MCP message");
        Ok(())
    }

    /// Read one Content-Length framed response.
    async fn receive_response(&mut self) -> Result<JsonRpcResponse> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(McpError::ConnectionClosed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            if let Some(len_str) = trimmed.strip_prefix("Content-Length:") {
                content_length = Some(len_str.trim().parse().map_err(|e| {
                    McpError::protocol(format!("invalid Content-Length: {}", e))
                })?);
            }
        }

        let content_length =
            content_length.ok_or_else(|| McpError::protocol("missing Content-Length header"))?;

        let mut body = vec![0u8; content_length];
        self.stdout.read_exact(&mut body).await?;

        let json_str = String::from_utf8(body)
            .map_err(|e| McpError::protocol(format!("invalid UTF-8 in response: {}", e)))?;

        tracing::trace!(content_length, json = %json_str, "received MCP message");

        Ok(serde_json::from_str(&json_str)?)
    }

    /// Kill the child and reap it.
    async fn shutdown(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Resolve a bare command name, with one deliberate affordance: a name
/// that is not on `PATH` but matches this process's own executable name
/// resolves to `current_exe()`. This lets test stubs and self-hosted
/// servers run without installation; it is not a general PATH search.
fn resolve_command(command: &str) -> PathBuf {
    let path = Path::new(command);
    if path.components().count() > 1 {
        return path.to_path_buf();
    }
    if find_on_path(command).is_some() {
        return path.to_path_buf();
    }
    if let Ok(exe) = std::env::current_exe() {
        let matches_self = exe
            .file_name()
            .map(|n| n == std::ffi::OsStr::new(command))
            .unwrap_or(false);
        if matches_self {
            tracing::debug!(command = %command, exe = %exe.display(), "substituting current executable");
            return exe;
        }
    }
    path.to_path_buf()
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

// ─────────────────────────────────────────────────────────────────────────────
// SSE stream parsing
// ─────────────────────────────────────────────────────────────────────────────

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SseEvent {
    /// Event name; "message" when the server omits the field.
    event: String,
    /// Data lines joined with newlines.
    data: String,
}

/// Incremental SSE parser over a byte stream.
struct SseStream {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send + Sync>>,
    buf: Vec<u8>,
}

impl SseStream {
    fn new(inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send + Sync>>) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Read the next complete event, pulling more bytes as needed.
    async fn next_event(&mut self) -> Result<SseEvent> {
        loop {
            if let Some(raw) = take_event_block(&mut self.buf) {
                if let Some(event) = parse_event_block(&raw) {
                    return Ok(event);
                }
                // Comment-only block, keep reading.
                continue;
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    return Err(McpError::transport(format!("SSE stream error: {}", e)))
                }
                None => return Err(McpError::ConnectionClosed),
            }
        }
    }
}

/// Remove and return the bytes of the first complete event block
/// (terminated by a blank line), if one is buffered.
fn take_event_block(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let mut last_was_newline = false;
    for i in 0..buf.len() {
        match buf[i] {
            b'\n' => {
                if last_was_newline {
                    return Some(buf.drain(..=i).collect());
                }
                last_was_newline = true;
            }
            b'\r' => {}
            _ => last_was_newline = false,
        }
    }
    None
}

/// Parse an event block into name + data. Returns `None` for blocks that
/// carry no data (comments, keep-alives).
fn parse_event_block(raw: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(raw);
    let mut event = String::new();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if data_lines.is_empty() && event.is_empty() {
        return None;
    }

    Some(SseEvent {
        event: if event.is_empty() {
            "message".to_string()
        } else {
            event
        },
        data: data_lines.join("\n"),
    })
}

/// Build a reqwest header map from descriptor headers.
fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| McpError::transport(format!("invalid header name '{}': {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| McpError::transport(format!("invalid header value for '{}': {}", key, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

// ─────────────────────────────────────────────────────────────────────────────
// SSE transport
// ─────────────────────────────────────────────────────────────────────────────

/// SSE transport: an open event stream for responses, a POST endpoint
/// for requests.
pub struct SseTransport {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    stream: SseStream,
}

impl SseTransport {
    /// Open the event stream and wait for the server to announce its
    /// POST endpoint.
    pub async fn connect(url: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
        let base = Url::parse(url)
            .map_err(|e| McpError::transport(format!("invalid URL '{}': {}", url, e)))?;
        let header_map = build_header_map(headers)?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        let resp = client
            .get(base.clone())
            .headers(header_map.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::transport(format!("SSE connect failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(McpError::transport(format!(
                "SSE endpoint returned {}",
                resp.status()
            )));
        }

        let mut stream = SseStream::new(Box::pin(resp.bytes_stream()));

        // The first event names the endpoint requests are POSTed to.
        let endpoint = loop {
            let event = stream.next_event().await?;
            if event.event == "endpoint" {
                break base.join(event.data.trim()).map_err(|e| {
                    McpError::protocol(format!("invalid endpoint '{}': {}", event.data, e))
                })?;
            }
        };

        tracing::debug!(endpoint = %endpoint, "SSE endpoint announced");

        Ok(Self {
            client,
            endpoint,
            headers: header_map,
            stream,
        })
    }

    async fn send_request(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.post(serde_json::to_string(request)?).await?;

        // The response arrives on the event stream; skip unrelated
        // server-to-client traffic until our id shows up.
        loop {
            let event = self.stream.next_event().await?;
            if event.event != "message" {
                continue;
            }
            if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&event.data) {
                if response.id == request.id {
                    return Ok(response);
                }
            }
        }
    }

    async fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        self.post(serde_json::to_string(notification)?).await
    }

    async fn post(&self, body: String) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| McpError::transport(format!("SSE POST failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(McpError::transport(format!(
                "SSE POST returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streamable HTTP transport
// ─────────────────────────────────────────────────────────────────────────────

/// Streamable HTTP transport: one POST per request.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    headers: HeaderMap,
    session_id: Option<HeaderValue>,
}

impl HttpTransport {
    /// Validate the URL and build the client. No network traffic happens
    /// until the first request.
    pub fn connect(url: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| McpError::transport(format!("invalid URL '{}': {}", url, e)))?;
        let headers = build_header_map(headers)?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            headers,
            session_id: None,
        })
    }

    async fn send_request(&mut self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let mut req = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(session_id) = &self.session_id {
            req = req.header(MCP_SESSION_ID, session_id.clone());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| McpError::transport(format!("HTTP request failed: {}", e)))?;

        // The server assigns a session id on initialize; echo it back on
        // everything that follows.
        if let Some(session_id) = resp.headers().get(MCP_SESSION_ID) {
            self.session_id = Some(session_id.clone());
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(McpError::transport(format!(
                "HTTP error {}: {}",
                status, body
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("text/event-stream") {
            let mut stream = SseStream::new(Box::pin(resp.bytes_stream()));
            loop {
                let event = stream.next_event().await?;
                if event.event != "message" {
                    continue;
                }
                if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&event.data) {
                    if response.id == request.id {
                        return Ok(response);
                    }
                }
            }
        } else {
            let text = resp
                .text()
                .await
                .map_err(|e| McpError::transport(format!("failed to read response body: {}", e)))?;
            tracing::trace!(json = %text, "received MCP HTTP response");
            Ok(serde_json::from_str(&text)?)
        }
    }

    async fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        let mut req = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(notification);
        if let Some(session_id) = &self.session_id {
            req = req.header(MCP_SESSION_ID, session_id.clone());
        }

        // Notifications expect no payload back; 202 Accepted is typical.
        let resp = req
            .send()
            .await
            .map_err(|e| McpError::transport(format!("HTTP notification failed: {}", e)))?;
        if let Some(session_id) = resp.headers().get(MCP_SESSION_ID) {
            self.session_id = Some(session_id.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_nonexistent_command() {
        let sink = StderrSink::Null;
        let result = StdioTransport::spawn(
            "nonexistent-mcp-server-12345",
            &[],
            &BTreeMap::new(),
            &sink,
        )
        .await;
        match result {
            Ok(_) => panic!("Expected spawn to fail"),
            Err(err) => assert!(matches!(err, McpError::SpawnFailed(_))),
        }
    }

    #[tokio::test]
    async fn test_spawn_cat() {
        if !cfg!(unix) {
            return;
        }
        let sink = StderrSink::Null;
        let mut transport = StdioTransport::spawn("cat", &[], &BTreeMap::new(), &sink)
            .await
            .unwrap();
        transport.shutdown().await;
    }

    #[test]
    fn test_http_transport_invalid_url() {
        let result = HttpTransport::connect("not a valid url", &BTreeMap::new());
        assert!(matches!(result, Err(McpError::Transport(_))));
    }

    #[test]
    fn test_http_transport_valid_url() {
        let result = HttpTransport::connect("http://localhost:8080/mcp", &BTreeMap::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_header_map() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer token123".to_string());
        let map = build_header_map(&headers).unwrap();
        assert_eq!(map.get("authorization").unwrap(), "Bearer token123");

        let mut bad = BTreeMap::new();
        bad.insert("bad header".to_string(), "x".to_string());
        assert!(build_header_map(&bad).is_err());
    }

    #[test]
    fn test_resolve_command_with_separator_is_untouched() {
        let resolved = resolve_command("/usr/bin/definitely-not-here");
        assert_eq!(resolved, PathBuf::from("/usr/bin/definitely-not-here"));
    }

    #[test]
    fn test_resolve_command_on_path_is_untouched() {
        if !cfg!(unix) {
            return;
        }
        // "cat" is on PATH everywhere we run tests.
        assert_eq!(resolve_command("cat"), PathBuf::from("cat"));
    }

    #[test]
    fn test_resolve_command_falls_back_to_current_exe() {
        let exe = std::env::current_exe().unwrap();
        let name = exe.file_name().unwrap().to_str().unwrap();
        // The test binary itself is not on PATH, so the fallback kicks in.
        if find_on_path(name).is_none() {
            assert_eq!(resolve_command(name), exe);
        }
    }

    #[test]
    fn test_take_event_block() {
        let mut buf = b"event: endpoint\ndata: /messages\n\nleftover".to_vec();
        let block = take_event_block(&mut buf).unwrap();
        assert_eq!(block, b"event: endpoint\ndata: /messages\n\n");
        assert_eq!(buf, b"leftover");

        let mut partial = b"data: incompl".to_vec();
        assert!(take_event_block(&mut partial).is_none());
    }

    #[test]
    fn test_take_event_block_crlf() {
        let mut buf = b"data: x\r\n\r\n".to_vec();
        let block = take_event_block(&mut buf).unwrap();
        let event = parse_event_block(&block).unwrap();
        assert_eq!(event.data, "x");
    }

    #[test]
    fn test_parse_event_block_defaults_to_message() {
        let event = parse_event_block(b"data: {\"jsonrpc\":\"2.0\"}\n\n").unwrap();
        assert_eq!(event.event, "message");
        assert_eq!(event.data, "{\"jsonrpc\":\"2.0\"}");
    }

    #[test]
    fn test_parse_event_block_multiline_data() {
        let event = parse_event_block(b"data: line one\ndata: line two\n\n").unwrap();
        assert_eq!(event.data, "line one\nline two");
    }

    #[test]
    fn test_parse_event_block_skips_comments() {
        assert!(parse_event_block(b": keep-alive\n\n").is_none());
    }
}
