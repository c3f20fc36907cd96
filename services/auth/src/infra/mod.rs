pub mod code_store;
pub mod rate_limit;
pub mod sweeper;
pub mod users;
