//! The MCP tool-discovery boundary and resource/prompt wire vocabulary.
//!
//! This crate deliberately carries no transport. [`McpClient`] is the seam
//! a stdio, child-process, or HTTP transport implements; the tool
//! dispatcher wraps each configured server's tools as ordinary
//! `ToolDyn`s without needing to know which transport backs them.
#![deny(missing_docs)]

pub mod client;
pub mod types;

pub use client::{McpClient, McpToolInfo};
