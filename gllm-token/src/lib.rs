//! Token estimation and caching shared by the context manager and provider
//! stream drivers.
#![deny(missing_docs)]

pub mod cache;
pub mod estimator;

pub use cache::{fingerprint, CacheStats, TokenCache, DEFAULT_MAX_SIZE};
pub use estimator::{
    estimate_block, estimate_json, estimate_message, estimate_string, estimate_system_prompt,
    estimate_tool_definition, IMAGE_OVERHEAD, MESSAGE_OVERHEAD, TOOL_CALL_OVERHEAD,
};
