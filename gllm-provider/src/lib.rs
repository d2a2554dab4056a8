//! The `Provider` capability-set trait, wire-agnostic stream types, the UI
//! collaborator boundary, and the generic turn-loop driver built on top of
//! them.
//!
//! Provider-family crates (OpenAI, Anthropic, Gemini, Volcengine) implement
//! [`provider::Provider`] against their own wire formats and translate into
//! [`types::StreamEvent`]; [`driver::Driver`] is generic over any such
//! provider and never sees a wire format directly.
#![deny(missing_docs)]

pub mod driver;
pub mod provider;
pub mod types;
pub mod ui;

pub use driver::{Driver, DriverConfig, TurnOutcome};
pub use provider::{EmbeddingProvider, EventStream, Provider};
pub use types::{ProviderRequest, StreamEvent};
pub use ui::{DataEvent, QuietUi, Status, Ui};
