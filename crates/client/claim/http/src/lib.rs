//! HTTP transport for the run backend.
//!
//! Implements [`client_claim_core::RunApi`] over `reqwest` with bearer-token
//! authentication. Each call is a single request; verdict interpretation
//! stays in `client-claim-core`.

mod client;
mod config;

pub use client::HttpRunApi;
pub use config::ApiConfig;
