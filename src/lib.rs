//! olca-mcp: a client library and MCP tool server over the openLCA
//! IPC endpoint, for automating Life Cycle Assessment workflows.
//!
//! The library half ([`internal`]) wraps the desktop application's
//! JSON-RPC interface with typed managers for search, data creation,
//! product systems, calculations, contribution ranking, Monte Carlo
//! uncertainty, scenario sweeps, and export. The tool half
//! ([`internal::mcp`]) exposes those operations as an MCP tool catalog
//! for AI agents, served over stdio or streamable HTTP.

pub mod cli;
pub mod command;
pub mod internal;
