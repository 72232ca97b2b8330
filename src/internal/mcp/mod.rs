//! MCP (Model Context Protocol) surface over the LCA client.
//!
//! This module builds an MCP server on top of `rmcp` by implementing
//! `ServerHandler` and registering one tool per LCA operation via
//! `rmcp`'s `#[tool_router]`.
//!
//! # Tools by study phase
//!
//! - Goal & scope: `test_connection`, `search_flows`, `search_processes`,
//!   `search_impact_methods`, `find_providers`
//! - Inventory: `create_product_flow`, `create_process`,
//!   `create_product_system`
//! - Impact assessment: `calculate_impacts`, `get_inventory_results`
//! - Interpretation: `analyze_contributions`, `run_monte_carlo`,
//!   `export_results`
//! - Utilities: `dispose_result`
//!
//! # Payload conventions
//!
//! Every tool answers with one JSON text content carrying a `success`
//! boolean plus either a result payload or an `error` string. Handler
//! failures never bubble up as protocol errors; a bad call must not
//! take down the hosting process.
//!
//! # Result lifecycle
//!
//! `calculate_impacts` registers its server-side result under a
//! generated `result_id`; follow-up tools (`get_inventory_results`,
//! `analyze_contributions`) look the handle up by that id, and
//! `dispose_result` releases it. Undisposed handles keep consuming
//! memory in the remote application.
pub mod server;
pub mod tools;
