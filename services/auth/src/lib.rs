//! Authentication and abuse control for KomiKAI: one-time email codes,
//! session tokens and per-key rate limiting, all held in process memory.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;
pub mod usecase;
