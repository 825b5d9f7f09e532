//! `gofannon add` - add an MCP server configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gofannon_mcp::ServerDescriptor;

use super::Context;

/// Arguments for `gofannon add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Unique name for this MCP server
    pub name: String,

    /// Command to spawn (stdio) or URL (sse/http transports)
    pub target: String,

    /// Use the SSE transport instead of stdio
    #[arg(long, conflicts_with = "http")]
    pub sse: bool,

    /// Use the streamable HTTP transport instead of stdio
    #[arg(long, conflicts_with = "sse")]
    pub http: bool,

    /// Arguments to pass to the command (stdio only)
    #[arg(last = true)]
    pub args: Vec<String>,

    /// Environment variables in KEY=VALUE format (stdio only)
    #[arg(long = "env", short = 'e')]
    pub env_vars: Vec<String>,

    /// HTTP header in KEY=VALUE format (sse/http only)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Connect/handshake timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Human-readable description
    #[arg(long)]
    pub description: Option<String>,

    /// Only expose the named tool (repeatable)
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Never expose the named tool (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Redirect the server's stderr to this file (stdio only)
    #[arg(long)]
    pub stderr_file: Option<PathBuf>,

    /// Append to the stderr file instead of truncating it
    #[arg(long, requires = "stderr_file")]
    pub stderr_append: bool,

    /// Let the server's stderr pass through to the terminal
    #[arg(long, conflicts_with = "stderr_file")]
    pub stderr_terminal: bool,

    /// Keep one session open across calls instead of reconnecting
    #[arg(long)]
    pub persistent: bool,

    /// Replace an existing server with the same name
    #[arg(long)]
    pub force: bool,
}

/// Run `gofannon add`.
pub async fn run(args: AddArgs, ctx: &Context) -> Result<()> {
    let mut descriptor = if args.sse {
        ServerDescriptor::sse(&args.name, &args.target)
    } else if args.http {
        ServerDescriptor::http(&args.name, &args.target)
    } else {
        ServerDescriptor::stdio(&args.name, &args.target).with_args(args.args.clone())
    };

    for var in &args.env_vars {
        let (key, value) = var.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("Invalid environment variable format: '{}'. Use KEY=VALUE.", var)
        })?;
        descriptor = descriptor.with_env_var(key, value);
    }

    for header in &args.headers {
        let (key, value) = header.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("Invalid header format: '{}'. Use KEY=VALUE.", header)
        })?;
        descriptor = descriptor.with_header(key, value);
    }

    descriptor = descriptor.with_timeout_secs(args.timeout);

    if let Some(description) = &args.description {
        descriptor = descriptor.with_description(description);
    }
    if !args.include.is_empty() {
        descriptor = descriptor.with_include_filter(args.include.clone());
    }
    if !args.exclude.is_empty() {
        descriptor = descriptor.with_exclude_filter(args.exclude.clone());
    }
    if let Some(path) = &args.stderr_file {
        descriptor = descriptor.with_stderr_file(path, args.stderr_append);
    }
    if args.stderr_terminal {
        descriptor.stderr_mode = gofannon_mcp::StderrMode::Terminal;
    }
    descriptor = descriptor.with_persistent(args.persistent);

    if ctx.verbose {
        println!("Adding MCP server: {}", args.name);
        println!("  Transport: {}", descriptor.transport);
        if let Some(command) = &descriptor.command {
            println!("  Command: {}", command);
            if !descriptor.args.is_empty() {
                println!("  Args: {}", descriptor.args.join(" "));
            }
        }
        if let Some(url) = &descriptor.url {
            println!("  URL: {}", url);
        }
    }

    let mut servers = ctx.load_servers()?;
    servers.add(descriptor, args.force)?;
    ctx.save_servers(&servers)?;

    let config_path = ctx.config_path()?;
    if ctx.json_output {
        use serde_json::json;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": "added",
                "name": args.name,
                "config_path": config_path.display().to_string(),
            }))?
        );
    } else {
        println!("Added MCP server '{}'.", args.name);
        println!("Config: {}", config_path.display());
    }

    Ok(())
}
