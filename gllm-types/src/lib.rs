//! Provider-agnostic message, request, and error types for the gllm workspace.
//!
//! This crate has no network and no filesystem dependency; it exists so that
//! `gllm-provider-*`, `gllm-context`, `gllm-store`, `gllm-tool`, and
//! `gllm-subagent` can all agree on one data model without depending on each
//! other.
#![deny(missing_docs)]

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
