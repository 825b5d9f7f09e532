//! `gofannon info` - show a server's stored configuration.

use anyhow::Result;
use clap::Args;

use gofannon_mcp::{StderrMode, TransportKind};

use super::Context;

/// Arguments for `gofannon info`.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Name of the MCP server
    pub name: String,
}

/// Run `gofannon info`.
pub async fn run(args: InfoArgs, ctx: &Context) -> Result<()> {
    let servers = ctx.load_servers()?;
    let descriptor = servers.require(&args.name)?;

    if ctx.json_output {
        // The stored record plus the name, exactly as the registry sees it.
        let mut record = serde_json::to_value(descriptor)?;
        record["name"] = serde_json::json!(descriptor.name);
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Server: {}", descriptor.name);
    if let Some(description) = &descriptor.description {
        println!("Description: {}", description);
    }
    println!("Transport: {}", descriptor.transport);

    match descriptor.transport {
        TransportKind::Stdio => {
            println!(
                "Command: {}",
                descriptor.command.as_deref().unwrap_or_default()
            );
            if !descriptor.args.is_empty() {
                println!("Args: {}", descriptor.args.join(" "));
            }
            if !descriptor.env.is_empty() {
                println!("Environment:");
                for (key, value) in &descriptor.env {
                    println!("  {}={}", key, value);
                }
            }
        }
        TransportKind::Sse | TransportKind::Http => {
            println!("URL: {}", descriptor.url.as_deref().unwrap_or_default());
            if !descriptor.headers.is_empty() {
                println!("Headers:");
                for (key, value) in &descriptor.headers {
                    println!("  {}: {}", key, value);
                }
            }
        }
    }

    println!("Timeout: {}s", descriptor.timeout_secs);
    println!(
        "Mode: {}",
        if descriptor.persistent {
            "persistent"
        } else {
            "per-call"
        }
    );

    match descriptor.stderr_mode {
        StderrMode::Disable => println!("Stderr: discarded"),
        StderrMode::Terminal => println!("Stderr: terminal"),
        StderrMode::File => {
            let path = descriptor
                .stderr_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let mode = if descriptor.stderr_append {
                "append"
            } else {
                "truncate"
            };
            println!("Stderr: {} ({})", path, mode);
        }
    }

    if let Some(include) = &descriptor.tool_filter_include {
        println!("Include tools: {}", include.join(", "));
    }
    if let Some(exclude) = &descriptor.tool_filter_exclude {
        println!("Exclude tools: {}", exclude.join(", "));
    }

    Ok(())
}
