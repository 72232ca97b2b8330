pub mod calculate;
pub mod ping;
pub mod search;
pub mod serve;
