//! MCP `ServerHandler` implementation and server state.

use std::sync::Arc;

use rmcp::{ServerHandler, handler::server::router::tool::ToolRouter, model::*, tool_handler};

use crate::internal::client::OlcaClient;
use crate::internal::session::ResultStore;

/// The MCP-facing server. Tool implementations live in
/// `crate::internal::mcp::tools` and are registered via `rmcp`'s
/// `#[tool_router]`.
#[derive(Clone)]
pub struct OlcaMcpServer {
    pub client: Arc<OlcaClient>,
    pub results: Arc<ResultStore>,
    tool_router: ToolRouter<OlcaMcpServer>,
}

impl OlcaMcpServer {
    pub fn new(client: Arc<OlcaClient>) -> Self {
        Self {
            client,
            results: Arc::new(ResultStore::new()),
            tool_router: Self::build_tool_router(),
        }
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for OlcaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::new(
                "olca-mcp",
                env!("CARGO_PKG_VERSION"),
            ))
            .with_instructions(
                "LCA tools backed by a running openLCA desktop application. \
                 Start with test_connection, search for flows/processes/methods, \
                 build inventory data, then calculate and interpret impacts. \
                 Always dispose_result when done with a result_id.",
            )
    }
}
