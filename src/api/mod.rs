//! Evaluation service integration.
//!
//! Provides the typed HTTP client for every endpoint the client layer uses:
//! sessions, the three collections, runs, judgments and plot assets.

mod client;

pub use client::{RunOutput, ServiceClient};
