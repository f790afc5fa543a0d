//! Server-side LLM orchestration engine: parallel inference fan-out over a
//! pool of backend credentials, feeding a declarative library of pipeline
//! steps selected by agent mode, streamed to the client over a line-oriented
//! wire protocol.
//!
//! # Module map
//!
//! - [`key_pool`]: rotating, shuffled pool of backend credentials.
//! - [`model_client`]: a single call to a single backend model.
//! - [`classifier`]: maps a failed call's HTTP status to a retry decision.
//! - [`parallel`]: fans a call out across every enabled model.
//! - [`integration`]: a single retried call, buffered or streaming.
//! - [`summarizer`]: best-effort history compression pre-step.
//! - [`context`]: the mutable record threaded through a request's steps.
//! - [`steps`]: the step library agent modes are built from.
//! - [`registry`]: `agentMode -> step list` lookup.
//! - [`orchestrator`]: ties the above together for one request.
//! - [`protocol`]: the newline-delimited wire frames sent to the client.
//! - [`server`]: the Axum HTTP transport.
//! - [`types`]: shared domain and backend wire types.
//! - [`error`]: the engine's error type.

pub mod classifier;
pub mod context;
pub mod error;
pub mod integration;
pub mod key_pool;
pub mod model_client;
pub mod orchestrator;
pub mod parallel;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod steps;
pub mod summarizer;
pub mod types;

pub use error::{Error, Result};
