//! The sub-agent dependency-graph executor behind the `spawn_subagents` tool.
//!
//! This crate owns scheduling only: dependency-graph construction, cycle
//! detection, a bounded worker pool, and publishing results to shared
//! state. It does not know how to run an agent turn — that would pull in
//! the provider stack, which itself depends on the tool dispatcher that
//! hosts `spawn_subagents`, so the dependency would cycle. Instead the
//! caller hands in an [`AgentRunner`]; the composition layer supplies one
//! backed by the actual turn driver.
#![deny(missing_docs)]

mod executor;
mod graph;

pub use executor::{AgentCatalog, AgentRunner, BatchReport, MemoryProvider, SubagentExecutor, TaskResult};

/// One task in a `spawn_subagents` batch, as the model specifies it.
#[derive(Debug, Clone)]
pub struct SubagentTaskSpec {
    /// Which configured agent runs this task.
    pub agent_name: String,
    /// The instruction to give that agent.
    pub instruction: String,
    /// Shared-state key the task's output is published under.
    pub task_key: String,
    /// Shared-state keys (by other tasks' `task_key`, or pre-existing
    /// entries) this task's instruction should be given as context.
    pub input_keys: Vec<String>,
    /// If true, this task is an explicit barrier: it waits on every task
    /// submitted earlier in the batch regardless of `input_keys`.
    pub wait: bool,
}
