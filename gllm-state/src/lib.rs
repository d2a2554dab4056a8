//! The `SharedState` blackboard and on-disk skill scanning/activation.
//!
//! Shared state is an in-process keyed store consulted by built-in tools
//! (`get_state`/`set_state`/`list_state`) and by the sub-agent executor,
//! which publishes each task's output under its task key for downstream
//! tasks to read. Skills are a separate, read-only concern: directories
//! under a configured root, each documented by a `SKILL.md`.
#![deny(missing_docs)]

mod blackboard;
mod skills;

pub use blackboard::SharedState;
pub use skills::{activate_skill, scan_skills, SkillError, SkillMeta};
