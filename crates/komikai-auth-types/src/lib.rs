//! Session types shared by KomiKAI services.
//!
//! Provides the session token signer and the session cookie helpers.

pub mod cookie;
pub mod token;
