#![deny(missing_docs)]
//! Composable async agentic AI framework for Rust.
//!
//! This crate is the composition layer: it wires a configured set of
//! agents, their tools, and the sub-agent executor behind a small
//! [`Session`] facade. Each dependency crate owns one concern —
//! `gllm-provider` the turn loop and streaming wire protocol,
//! `gllm-tool` the built-in tool inventory, `gllm-subagent` batch
//! dispatch, `gllm-store` conversation persistence — and this crate only
//! does the wiring a host application would otherwise have to repeat.

/// Typed agent/provider/template configuration.
pub mod config;
/// The [`AnyProvider`] enum dispatching across provider families.
pub mod provider;
/// The [`Session`] facade and its supporting implementations.
pub mod session;

pub use config::{AgentConfig, ConfigError, GllmConfig, ProviderKind, TemplateRef};
pub use provider::{AnyProvider, ProviderSecrets};
pub use session::Session;

/// Re-exports of the dependency crates' most commonly needed types, for
/// callers who want the facade without hunting through each crate.
pub mod prelude {
    pub use gllm_provider::{DriverConfig, TurnOutcome, Ui};
    pub use gllm_store::{ConversationStore, Dialect};
    pub use gllm_types::{CompletionRequest, Message, ThinkingLevel};

    pub use crate::config::{AgentConfig, GllmConfig, ProviderKind, TemplateRef};
    pub use crate::provider::{AnyProvider, ProviderSecrets};
    pub use crate::session::Session;
}
