//! This module implements the `serve` command.
//!
//! It starts the MCP tool server over stdio (default, for desktop MCP
//! hosts) or over streamable HTTP with `--http`. The openLCA endpoint
//! is taken from `OPENLCA_HOST`/`OPENLCA_PORT`.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    service::TowerToHyperService,
};
use rmcp::{
    service::serve_server,
    transport::{
        async_rw::AsyncRwTransport,
        io::stdio,
        streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
    },
};

use crate::internal::client::OlcaClient;
use crate::internal::config::Config;
use crate::internal::mcp::server::OlcaMcpServer;

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Serve over streamable HTTP instead of stdio
    #[clap(long, required = false)]
    pub http: bool,

    /// Bind address for HTTP mode
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port for HTTP mode
    #[clap(long, default_value_t = 3000)]
    pub port: u16,
}

pub async fn execute(args: ServeArgs) {
    let config = Config::from_env();
    let client = Arc::new(OlcaClient::connect(&config.endpoint()));

    if client.test_connection().await {
        tracing::info!(endpoint = %config.endpoint(), "connected to openLCA");
    } else {
        tracing::warn!(
            endpoint = %config.endpoint(),
            "could not verify openLCA connection; make sure the IPC server is running"
        );
    }

    let server = Arc::new(OlcaMcpServer::new(client));
    if args.http {
        if let Err(e) = serve_http(&args, server).await {
            eprintln!("Error: {e}");
        }
    } else {
        serve_stdio(server).await;
    }
}

async fn serve_stdio(server: Arc<OlcaMcpServer>) {
    let (stdin, stdout) = stdio();
    let transport = AsyncRwTransport::new_server(stdin, stdout);

    match serve_server(server, transport).await {
        Ok(running) => {
            if let Err(e) = running.waiting().await {
                eprintln!("MCP stdio server error: {e}");
            }
        }
        Err(e) => {
            eprintln!("Failed to start MCP stdio server: {e}");
        }
    }
}

async fn serve_http(args: &ServeArgs, server: Arc<OlcaMcpServer>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "MCP HTTP server listening");

    let service = TowerToHyperService::new(StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
            accept = listener.accept() => {
                match accept {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let service = service.clone();
                        tokio::spawn(async move {
                            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::default())
                                .serve_connection(io, service)
                                .await
                            {
                                eprintln!("MCP connection error: {e:?}");
                            }
                        });
                    }
                    Err(e) => {
                        eprintln!("MCP accept error: {e:?}");
                    }
                }
            }
        }
    }
}
