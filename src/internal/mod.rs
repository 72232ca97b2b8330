pub mod calculations;
pub mod client;
pub mod config;
pub mod contributions;
pub mod data;
pub mod export;
pub mod ipc;
pub mod mcp;
pub mod parameters;
pub mod results;
pub mod search;
pub mod session;
pub mod systems;
pub mod uncertainty;
