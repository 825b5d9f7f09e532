//! Gofannon - expose MCP servers as LLM tool sets
//!
//! Main entry point for the Gofannon CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{add, info, list, remove, test};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Gofannon - expose MCP servers as LLM tool sets
#[derive(Parser)]
#[command(name = "gofannon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path (default: ~/.config/gofannon/mcp_servers.json)
    #[arg(long, global = true, env = "GOFANNON_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add an MCP server configuration
    Add(add::AddArgs),

    /// Remove an MCP server configuration
    Remove(remove::RemoveArgs),

    /// List configured MCP servers
    List(list::ListArgs),

    /// Connect to a server and verify it responds
    Test(test::TestArgs),

    /// Show a server's stored configuration
    Info(info::InfoArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "gofannon=debug,gofannon_mcp=debug,gofannon_toolbox=debug,gofannon_config=debug,info"
    } else {
        "gofannon=info,gofannon_mcp=warn,gofannon_toolbox=warn,gofannon_config=warn,warn"
    };

    let log_dir = dirs::config_dir()
        .map(|d| d.join("gofannon").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gofannon.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "gofannon=trace,gofannon_mcp=trace,gofannon_toolbox=trace,gofannon_config=trace,info",
                )),
        )
        .init();

    // Create context for commands
    let ctx = commands::Context {
        config_path: cli.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    tracing::debug!(config = ?ctx.config_path, json = ctx.json_output, "gofannon starting");

    // Dispatch to command handlers
    match cli.command {
        Commands::Add(args) => add::run(args, &ctx).await,
        Commands::Remove(args) => remove::run(args, &ctx).await,
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Test(args) => test::run(args, &ctx).await,
        Commands::Info(args) => info::run(args, &ctx).await,
    }
}
