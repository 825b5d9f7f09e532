//! `gofannon remove` - remove an MCP server configuration.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for `gofannon remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Name of the MCP server to remove
    pub name: String,
}

/// Run `gofannon remove`.
pub async fn run(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let mut servers = ctx.load_servers()?;
    let removed = servers.remove(&args.name)?;
    ctx.save_servers(&servers)?;

    if ctx.json_output {
        use serde_json::json;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": "removed",
                "name": removed.name,
            }))?
        );
    } else {
        println!("Removed MCP server '{}'.", removed.name);
    }

    Ok(())
}
