use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use siteflow::commands::{self, ToolCommand};
use siteflow::config::SiteflowConfig;
use siteflow::serve::mcp;
use siteflow::tools::Toolbox;

#[derive(Parser)]
#[command(name = "siteflow-mcp")]
#[command(about = "Siteflow workflow tools for LLM hosts (MCP) and the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio (default)
    Serve,

    #[command(flatten)]
    Tool(ToolCommand),
}

/// Log to stderr; stdout carries the MCP stream.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match SiteflowConfig::load(cli.env_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    let toolbox = Toolbox::from_config(&config);

    let exit_code = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => mcp::cmd_serve_mcp(toolbox),
        Commands::Tool(command) => commands::run(command, &toolbox, &config.project_id),
    };
    std::process::exit(exit_code);
}
