//! Consumption layer for the openLCA IPC protocol: JSON-RPC transport,
//! entity schema, error taxonomy, and the typed [`client::IpcClient`].

pub mod client;
pub mod error;
pub mod protocol;
pub mod schema;
