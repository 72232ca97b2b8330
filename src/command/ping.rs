//! This module implements the `ping` command: a one-shot liveness
//! check against the openLCA IPC endpoint.

use clap::Parser;

use crate::internal::client::OlcaClient;
use crate::internal::config::Config;

#[derive(Parser, Debug, Clone)]
pub struct PingArgs {
    /// Override the openLCA host (default from OPENLCA_HOST)
    #[clap(long, required = false)]
    pub host: Option<String>,

    /// Override the openLCA port (default from OPENLCA_PORT)
    #[clap(long, required = false)]
    pub port: Option<u16>,
}

pub async fn execute(args: PingArgs) {
    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let endpoint = config.endpoint();
    let client = OlcaClient::connect(&endpoint);
    if client.test_connection().await {
        println!("✓ connected to openLCA at {endpoint}");
    } else {
        eprintln!("✗ could not reach openLCA at {endpoint}");
        eprintln!("  make sure openLCA is running with its IPC server started");
    }
}
