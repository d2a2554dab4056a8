//! Dependency-aware scheduling and execution of a `spawn_subagents` batch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gllm_state::SharedState;
use gllm_types::{SubagentError, TaskStatus};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::graph;
use crate::SubagentTaskSpec;

const DEFAULT_MAX_WORKERS: usize = 5;
const MAX_WORKERS_CAP: usize = 5;
const DEP_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs one agent turn to completion and returns its final text output.
///
/// Implemented outside this crate (by the composition layer, wrapping the
/// turn driver in quiet, auto-approve, no-persistence mode) to avoid a
/// dependency cycle: the driver depends on the tool dispatcher, which
/// hosts `spawn_subagents`, which depends on this crate.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Run `agent_name` with the given system prompt and instruction,
    /// returning its final output text.
    async fn run(&self, agent_name: &str, system_prompt: &str, instruction: &str, cancellation: &CancellationToken) -> Result<String, SubagentError>;
}

/// Looks up a configured agent's base system prompt by name.
pub trait AgentCatalog: Send + Sync {
    /// The agent's configured base system prompt, or `None` if no such
    /// agent is configured.
    fn system_prompt(&self, agent_name: &str) -> Option<String>;
}

/// Supplies the formatted memory listing appended to every sub-agent's
/// system prompt.
pub trait MemoryProvider: Send + Sync {
    /// A formatted block describing currently saved memory, or an empty
    /// string if there is none.
    fn format_memory(&self) -> String;
}

/// Outcome of one task in a batch.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// The task's assigned id.
    pub id: String,
    /// The task's `task_key`.
    pub task_key: String,
    /// Which agent ran (or would have run) this task.
    pub agent_name: String,
    /// Final status.
    pub status: TaskStatus,
    /// Error detail, if `status` is `Failed`.
    pub error: Option<String>,
}

/// Aggregate outcome of a `spawn_subagents` batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Per-task outcomes, in submission order.
    pub results: Vec<TaskResult>,
    /// Number of tasks that completed successfully.
    pub completed: usize,
    /// Number of tasks that failed.
    pub failed: usize,
    /// Number of tasks cancelled (dependency failure, timeout, or explicit
    /// cancellation).
    pub cancelled: usize,
    /// Shared-state keys this batch published to.
    pub published_keys: Vec<String>,
}

impl BatchReport {
    fn from_results(results: Vec<TaskResult>) -> Self {
        let mut report = BatchReport { results, ..Default::default() };
        for result in &report.results {
            match result.status {
                TaskStatus::Completed => {
                    report.completed += 1;
                    report.published_keys.push(result.task_key.clone());
                }
                TaskStatus::Failed => report.failed += 1,
                TaskStatus::Cancelled => report.cancelled += 1,
                TaskStatus::Pending | TaskStatus::Running => {}
            }
        }
        report
    }
}

fn sanitize(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect()
}

fn now_ns() -> u128 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0)
}

/// Schedules and runs a batch of sub-agent tasks respecting their
/// dependency graph and a bounded worker pool.
pub struct SubagentExecutor {
    shared_state: Arc<SharedState>,
    runner: Arc<dyn AgentRunner>,
    catalog: Arc<dyn AgentCatalog>,
    memory: Arc<dyn MemoryProvider>,
    output_dir: PathBuf,
    max_workers: usize,
}

impl SubagentExecutor {
    /// Build an executor. `output_dir` is where each task's raw output is
    /// mirrored as a file, tagged by agent name and task key.
    #[must_use]
    pub fn new(shared_state: Arc<SharedState>, runner: Arc<dyn AgentRunner>, catalog: Arc<dyn AgentCatalog>, memory: Arc<dyn MemoryProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self { shared_state, runner, catalog, memory, output_dir: output_dir.into(), max_workers: DEFAULT_MAX_WORKERS }
    }

    /// Override the worker pool size; clamped to `[1, 5]` regardless of
    /// the requested value.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.clamp(1, MAX_WORKERS_CAP);
        self
    }

    /// Run `specs` to completion (or `timeout_duration`, whichever comes
    /// first), honoring dependencies and the worker pool.
    pub async fn run_batch(&self, specs: Vec<SubagentTaskSpec>, timeout_duration: Duration, cancellation: CancellationToken) -> BatchReport {
        if specs.is_empty() {
            return BatchReport::default();
        }

        let deps = graph::build_dependencies(&specs);
        if graph::has_cycle(&deps) {
            let error = SubagentError::CircularDependency.to_string();
            let results = specs
                .iter()
                .enumerate()
                .map(|(i, spec)| TaskResult {
                    id: format!("task-{}-{i}", now_ns()),
                    task_key: spec.task_key.clone(),
                    agent_name: spec.agent_name.clone(),
                    status: TaskStatus::Failed,
                    error: Some(error.clone()),
                })
                .collect();
            return BatchReport::from_results(results);
        }

        let unix_ns = now_ns();
        let ids: Vec<String> = (0..specs.len()).map(|i| format!("task-{unix_ns}-{i}")).collect();
        let statuses = Arc::new(Mutex::new(vec![TaskStatus::Pending; specs.len()]));
        let errors = Arc::new(Mutex::new(vec![None::<String>; specs.len()]));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        let run_all = async {
            let mut handles = Vec::with_capacity(specs.len());
            for (idx, spec) in specs.into_iter().enumerate() {
                let handle = tokio::spawn(run_one(RunOneArgs {
                    idx,
                    id: ids[idx].clone(),
                    spec,
                    deps: deps[idx].clone(),
                    statuses: Arc::clone(&statuses),
                    errors: Arc::clone(&errors),
                    semaphore: Arc::clone(&semaphore),
                    shared_state: Arc::clone(&self.shared_state),
                    runner: Arc::clone(&self.runner),
                    catalog: Arc::clone(&self.catalog),
                    memory: Arc::clone(&self.memory),
                    output_dir: self.output_dir.clone(),
                    cancellation: cancellation.child_token(),
                }));
                handles.push(handle);
            }
            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                results.push(handle.await.unwrap_or_else(|e| TaskResult {
                    id: "unknown".into(),
                    task_key: String::new(),
                    agent_name: String::new(),
                    status: TaskStatus::Failed,
                    error: Some(format!("task panicked: {e}")),
                }));
            }
            results
        };

        match tokio::time::timeout(timeout_duration, run_all).await {
            Ok(results) => BatchReport::from_results(results),
            Err(_) => {
                tracing::warn!(timeout = ?timeout_duration, "sub-agent batch timed out");
                cancellation.cancel();
                let statuses = statuses.lock().await;
                let errors = errors.lock().await;
                let results = ids
                    .into_iter()
                    .enumerate()
                    .map(|(i, id)| TaskResult {
                        id,
                        task_key: String::new(),
                        agent_name: String::new(),
                        status: if statuses[i] == TaskStatus::Completed { TaskStatus::Completed } else { TaskStatus::Cancelled },
                        error: errors[i].clone(),
                    })
                    .collect();
                BatchReport::from_results(results)
            }
        }
    }
}

struct RunOneArgs {
    idx: usize,
    id: String,
    spec: SubagentTaskSpec,
    deps: Vec<usize>,
    statuses: Arc<Mutex<Vec<TaskStatus>>>,
    errors: Arc<Mutex<Vec<Option<String>>>>,
    semaphore: Arc<Semaphore>,
    shared_state: Arc<SharedState>,
    runner: Arc<dyn AgentRunner>,
    catalog: Arc<dyn AgentCatalog>,
    memory: Arc<dyn MemoryProvider>,
    output_dir: PathBuf,
    cancellation: CancellationToken,
}

async fn set_status(statuses: &Mutex<Vec<TaskStatus>>, errors: &Mutex<Vec<Option<String>>>, idx: usize, status: TaskStatus, error: Option<String>) {
    statuses.lock().await[idx] = status;
    if error.is_some() {
        errors.lock().await[idx] = error;
    }
}

async fn run_one(args: RunOneArgs) -> TaskResult {
    let RunOneArgs { idx, id, spec, deps, statuses, errors, semaphore, shared_state, runner, catalog, memory, output_dir, cancellation } = args;

    loop {
        if cancellation.is_cancelled() {
            set_status(&statuses, &errors, idx, TaskStatus::Cancelled, None).await;
            return TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Cancelled, error: None };
        }
        let (all_done, any_bad) = {
            let s = statuses.lock().await;
            (deps.iter().all(|&d| s[d] == TaskStatus::Completed), deps.iter().any(|&d| matches!(s[d], TaskStatus::Failed | TaskStatus::Cancelled)))
        };
        if any_bad {
            let error = Some("a dependency failed or was cancelled".to_string());
            set_status(&statuses, &errors, idx, TaskStatus::Cancelled, error.clone()).await;
            return TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Cancelled, error };
        }
        if all_done {
            break;
        }
        tokio::select! {
            () = tokio::time::sleep(DEP_POLL_INTERVAL) => {}
            () = cancellation.cancelled() => {
                set_status(&statuses, &errors, idx, TaskStatus::Cancelled, None).await;
                return TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Cancelled, error: None };
            }
        }
    }

    set_status(&statuses, &errors, idx, TaskStatus::Running, None).await;
    let Ok(_permit) = semaphore.acquire().await else {
        set_status(&statuses, &errors, idx, TaskStatus::Cancelled, None).await;
        return TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Cancelled, error: None };
    };

    let Some(base_prompt) = catalog.system_prompt(&spec.agent_name) else {
        let error = SubagentError::ConfigNotFound(spec.agent_name.clone()).to_string();
        set_status(&statuses, &errors, idx, TaskStatus::Failed, Some(error.clone())).await;
        return TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Failed, error: Some(error) };
    };
    let system_prompt = format!("{base_prompt}\n\n{}", memory.format_memory());

    let mut instruction = spec.instruction.clone();
    if !spec.input_keys.is_empty() {
        instruction.push_str("\n\nContext from previous tasks:\n");
        for key in &spec.input_keys {
            if let Some(entry) = shared_state.get(key).await {
                instruction.push_str(&format!("- {key} (from {}): {}\n", entry.created_by, entry.value));
            }
        }
    }

    match runner.run(&spec.agent_name, &system_prompt, &instruction, &cancellation).await {
        Ok(content) => {
            let output_path = output_dir.join(format!("{}-{}.md", sanitize(&spec.agent_name), sanitize(&spec.task_key)));
            if let Some(parent) = output_path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            if let Err(e) = tokio::fs::write(&output_path, &content).await {
                tracing::warn!(path = %output_path.display(), error = %e, "failed to mirror sub-agent output to disk");
            }
            shared_state.set(spec.task_key.clone(), content, spec.agent_name.clone(), "text/plain").await;
            set_status(&statuses, &errors, idx, TaskStatus::Completed, None).await;
            TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Completed, error: None }
        }
        Err(e) => {
            let error = e.to_string();
            set_status(&statuses, &errors, idx, TaskStatus::Failed, Some(error.clone())).await;
            TaskResult { id, task_key: spec.task_key, agent_name: spec.agent_name, status: TaskStatus::Failed, error: Some(error) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct EchoRunner;
    #[async_trait]
    impl AgentRunner for EchoRunner {
        async fn run(&self, agent_name: &str, _system_prompt: &str, instruction: &str, _cancellation: &CancellationToken) -> Result<String, SubagentError> {
            if agent_name == "broken" {
                return Err(SubagentError::Failed("always fails".into()));
            }
            Ok(format!("[{agent_name}] {instruction}"))
        }
    }

    struct FixedCatalog;
    impl AgentCatalog for FixedCatalog {
        fn system_prompt(&self, agent_name: &str) -> Option<String> {
            if agent_name == "unknown" {
                None
            } else {
                Some(format!("You are {agent_name}."))
            }
        }
    }

    struct NoMemory;
    impl MemoryProvider for NoMemory {
        fn format_memory(&self) -> String {
            String::new()
        }
    }

    fn spec(agent: &str, task_key: &str, input_keys: &[&str], wait: bool) -> SubagentTaskSpec {
        SubagentTaskSpec {
            agent_name: agent.into(),
            instruction: "do the thing".into(),
            task_key: task_key.into(),
            input_keys: input_keys.iter().map(|s| s.to_string()).collect(),
            wait,
        }
    }

    fn executor(dir: &std::path::Path) -> SubagentExecutor {
        SubagentExecutor::new(Arc::new(SharedState::new()), Arc::new(EchoRunner), Arc::new(FixedCatalog), Arc::new(NoMemory), dir)
    }

    #[tokio::test]
    async fn independent_tasks_all_complete() {
        let dir = tempdir().unwrap();
        let report = executor(dir.path())
            .run_batch(vec![spec("a", "k1", &[], false), spec("b", "k2", &[], false)], Duration::from_secs(5), CancellationToken::new())
            .await;
        assert_eq!(report.completed, 2);
        assert_eq!(report.published_keys.len(), 2);
    }

    #[tokio::test]
    async fn consumer_waits_for_producer_and_sees_its_output() {
        let dir = tempdir().unwrap();
        let exec = executor(dir.path());
        let report = exec.run_batch(vec![spec("a", "producer", &[], false), spec("b", "consumer", &["producer"], false)], Duration::from_secs(5), CancellationToken::new()).await;
        assert_eq!(report.completed, 2);
        let consumer = report.results.iter().find(|r| r.task_key == "consumer").unwrap();
        assert_eq!(consumer.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn cycle_fails_every_task_without_running_any() {
        let dir = tempdir().unwrap();
        let report = executor(dir.path()).run_batch(vec![spec("a", "x", &["y"], false), spec("b", "y", &["x"], false)], Duration::from_secs(5), CancellationToken::new()).await;
        assert_eq!(report.failed, 2);
        assert!(report.results.iter().all(|r| r.error.as_deref() == Some("circular dependency detected")));
    }

    #[tokio::test]
    async fn unknown_agent_fails_with_config_not_found() {
        let dir = tempdir().unwrap();
        let report = executor(dir.path()).run_batch(vec![spec("unknown", "k", &[], false)], Duration::from_secs(5), CancellationToken::new()).await;
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn dependent_of_failed_task_is_cancelled_not_run() {
        let dir = tempdir().unwrap();
        let report = executor(dir.path()).run_batch(vec![spec("broken", "producer", &[], false), spec("a", "consumer", &["producer"], false)], Duration::from_secs(5), CancellationToken::new()).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.cancelled, 1);
    }

    #[tokio::test]
    async fn wait_barrier_runs_after_all_earlier_tasks() {
        let dir = tempdir().unwrap();
        let report = executor(dir.path())
            .run_batch(vec![spec("a", "k1", &[], false), spec("b", "k2", &[], false), spec("c", "k3", &[], true)], Duration::from_secs(5), CancellationToken::new())
            .await;
        assert_eq!(report.completed, 3);
    }
}
