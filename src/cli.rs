//! CLI entry for olca-mcp, defining clap subcommands and dispatching each command handler.

use clap::{Parser, Subcommand};

use crate::command;
use crate::internal::ipc::error::OlcaError;

#[derive(Parser, Debug)]
#[command(about = "olca-mcp: openLCA IPC client and MCP tool server", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Serve the LCA tool catalog over MCP (stdio by default)")]
    Serve(command::serve::ServeArgs),
    #[command(about = "Check the connection to the openLCA IPC endpoint")]
    Ping(command::ping::PingArgs),
    #[command(about = "Search flows, processes, or impact methods by keywords")]
    Search(command::search::SearchArgs),
    #[command(about = "Run an impact calculation for a product system")]
    Calculate(command::calculate::CalculateArgs),
}

/// Parses the command line and executes the matching handler.
/// - `args`: parse from the process arguments if `None`, otherwise from the given slice.
#[tokio::main]
pub async fn parse(args: Option<&[&str]>) -> Result<(), OlcaError> {
    parse_async(args).await
}

/// `async` version of the [parse] function
pub async fn parse_async(args: Option<&[&str]>) -> Result<(), OlcaError> {
    let args = match args {
        Some(args) => {
            Cli::try_parse_from(args).map_err(|e| OlcaError::InvalidArgument(e.to_string()))?
        }
        None => Cli::parse(),
    };

    match args.command {
        Commands::Serve(args) => command::serve::execute(args).await,
        Commands::Ping(args) => command::ping::execute(args).await,
        Commands::Search(args) => command::search::execute(args).await,
        Commands::Calculate(args) => command::calculate::execute(args).await,
    }
    Ok(())
}

/// this test is to verify that the CLI can be built without panicking
/// according [clap dock](https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_4/index.html)
#[test]
fn verify_cli() {
    use clap::CommandFactory;

    Cli::command().debug_assert()
}
