//! Shared building blocks for KomiKAI services: clock, env config, tracing setup.

pub mod clock;
pub mod config;
pub mod tracing;
