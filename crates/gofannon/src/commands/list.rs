//! `gofannon list` - list configured MCP servers.

use anyhow::Result;
use clap::Args;

use gofannon_mcp::ServerDescriptor;
use gofannon_toolbox::Toolbox;

use super::Context;

/// Arguments for `gofannon list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show tools available from each server (requires connecting)
    #[arg(long)]
    pub tools: bool,
}

/// Run `gofannon list`.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let servers = ctx.load_servers()?;

    if servers.is_empty() {
        if ctx.json_output {
            println!("[]");
        } else {
            println!("No MCP servers configured.");
            println!();
            println!("Add a server with:");
            println!("  gofannon add <name> <command> [-- args...]");
            println!("  gofannon add <name> <url> --sse");
            println!("  gofannon add <name> <url> --http");
        }
        return Ok(());
    }

    if ctx.json_output {
        print_list_json(&servers.iter().collect::<Vec<_>>(), args.tools).await?;
    } else {
        print_list_table(&servers.iter().collect::<Vec<_>>(), args.tools, ctx.verbose).await?;
    }

    Ok(())
}

/// Print server list as JSON.
async fn print_list_json(servers: &[&ServerDescriptor], show_tools: bool) -> Result<()> {
    use serde_json::json;

    let mut output = Vec::new();

    for server in servers {
        let mut entry = json!({
            "name": server.name,
            "transport": server.transport.as_str(),
            "persistent": server.persistent,
        });

        match server.transport {
            gofannon_mcp::TransportKind::Stdio => {
                entry["command"] = json!(server.command);
                if !server.args.is_empty() {
                    entry["args"] = json!(server.args);
                }
            }
            _ => {
                entry["url"] = json!(server.url);
            }
        }

        if show_tools {
            match connect_and_list_tools(server).await {
                Ok(tools) => {
                    entry["status"] = json!("connected");
                    entry["tools"] = json!(tools);
                }
                Err(e) => {
                    entry["status"] = json!("error");
                    entry["error"] = json!(e.to_string());
                }
            }
        }

        output.push(entry);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print server list as a table.
async fn print_list_table(
    servers: &[&ServerDescriptor],
    show_tools: bool,
    verbose: bool,
) -> Result<()> {
    println!(
        "{:<20} {:<10} {:<12} {:<40}",
        "NAME", "TRANSPORT", "MODE", "TARGET"
    );
    println!("{}", "-".repeat(84));

    for server in servers {
        let mode = if server.persistent {
            "persistent"
        } else {
            "per-call"
        };

        let target = match server.transport {
            gofannon_mcp::TransportKind::Stdio => {
                let mut cmd = server.command.clone().unwrap_or_default();
                if !server.args.is_empty() {
                    cmd.push(' ');
                    cmd.push_str(&server.args.join(" "));
                }
                cmd
            }
            _ => server.url.clone().unwrap_or_default(),
        };

        println!(
            "{:<20} {:<10} {:<12} {:<40}",
            truncate(&server.name, 20),
            server.transport,
            mode,
            truncate(&target, 40)
        );

        if verbose {
            if !server.env.is_empty() {
                println!("  Environment:");
                for (key, value) in &server.env {
                    println!("    {}={}", key, value);
                }
            }
            if !server.headers.is_empty() {
                println!("  Headers:");
                for (key, value) in &server.headers {
                    println!("    {}: {}", key, value);
                }
            }
            println!("  Timeout: {}s", server.timeout_secs);
        }

        if show_tools {
            match connect_and_list_tools(server).await {
                Ok(tools) => {
                    if tools.is_empty() {
                        println!("  Tools: (none)");
                    } else {
                        println!("  Tools ({}):", tools.len());
                        for tool in tools {
                            println!("    - {}", tool);
                        }
                    }
                }
                Err(e) => {
                    println!("  Error: {}", e);
                }
            }
        }
    }

    Ok(())
}

/// Connect to an MCP server and list the tools it would expose.
async fn connect_and_list_tools(server: &ServerDescriptor) -> Result<Vec<String>> {
    let toolbox = Toolbox::new(server.clone())?;
    let bindings = toolbox.bind(false).await?;
    let names = bindings.iter().map(|b| b.name().to_string()).collect();
    toolbox.close().await;
    Ok(names)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
