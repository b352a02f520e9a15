mod cli;
mod commands;
mod config;
mod download;
mod error;
mod executor;
mod handle;
mod mcp;
mod page_range;
mod pdf;
mod selection;
mod session;
mod upload;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();

    // stdout belongs to the MCP transport, so logs go to stderr
    TermLogger::init(
        settings.log_level,
        ConfigBuilder::new().set_time_format_rfc3339().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(&settings).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Split {
            path,
            ranges,
            output_dir,
        } => {
            commands::split::run(&path, &ranges, &output_dir, &settings).await?;
        }
    }

    Ok(())
}
