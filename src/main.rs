//! Binary entry point for olca-mcp.

use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so MCP stdio framing on stdout stays clean.
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .ok();

    if let Err(e) = olca_mcp::cli::parse(None) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
