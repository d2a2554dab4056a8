//! The `Session` facade: wires configuration, tools, providers, and
//! sub-agent dispatch into one object a host application drives one turn
//! at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::Arc;

use gllm_provider::{Driver, DriverConfig, QuietUi, TurnOutcome, Ui};
use gllm_state::SharedState;
use gllm_store::{ConversationStore, Dialect};
use gllm_subagent::{AgentCatalog, AgentRunner, MemoryProvider, SubagentExecutor};
use gllm_tool::builtin::agent_tools::{AgentDirectory, AgentSummary};
use gllm_tool::builtin::BuiltinToolsConfig;
use gllm_tool::confirm::AutoApprove;
use gllm_tool::ToolRegistry;
use gllm_types::{DriverError, Message, SystemPrompt};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{AgentConfig, GllmConfig};
use crate::provider::{AnyProvider, ProviderSecrets};

const MAX_AGENT_SWITCHES: usize = 10;

/// [`AgentDirectory`] backed by a [`GllmConfig`], with the active agent
/// tracked as interior-mutable state so `switch_agent` can move it.
pub struct ConfigAgentDirectory {
    agents: Vec<AgentSummary>,
    active: Mutex<String>,
}

impl ConfigAgentDirectory {
    /// Build a directory listing every agent in `config`, starting active
    /// on `config.agent`.
    #[must_use]
    pub fn new(config: &GllmConfig) -> Self {
        let mut agents: Vec<AgentSummary> = config
            .agents
            .iter()
            .map(|(name, cfg)| AgentSummary { name: name.clone(), description: cfg.description.clone() })
            .collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Self { agents, active: Mutex::new(config.agent.clone()) }
    }

    fn set_active(&self, name: &str) {
        *self.active.lock().unwrap() = name.to_string();
    }
}

impl AgentDirectory for ConfigAgentDirectory {
    fn list(&self) -> Vec<AgentSummary> {
        self.agents.clone()
    }

    fn exists(&self, name: &str) -> bool {
        self.agents.iter().any(|a| a.name == name)
    }

    fn active(&self) -> String {
        self.active.lock().unwrap().clone()
    }
}

/// [`AgentCatalog`] backed by a [`GllmConfig`]'s resolved system prompts.
struct ConfigCatalog(Arc<GllmConfig>);

impl AgentCatalog for ConfigCatalog {
    fn system_prompt(&self, agent_name: &str) -> Option<String> {
        self.0.system_prompt_for(agent_name)
    }
}

/// [`MemoryProvider`] backed by the same durable memory file the
/// `list_memory`/`save_memory` tools read and write.
struct FileMemoryProvider(PathBuf);

impl MemoryProvider for FileMemoryProvider {
    fn format_memory(&self) -> String {
        match std::fs::read_to_string(&self.0) {
            Ok(content) if !content.trim().is_empty() => format!("Saved memory:\n{content}"),
            _ => String::new(),
        }
    }
}

/// Refuses to run anything. Installed as the `spawn_subagents` backend
/// inside a sub-agent's own tool registry so sub-agents cannot recursively
/// spawn further sub-agents.
struct NullAgentRunner;

#[async_trait]
impl AgentRunner for NullAgentRunner {
    async fn run(&self, _agent_name: &str, _system_prompt: &str, _instruction: &str, _cancellation: &CancellationToken) -> Result<String, gllm_types::SubagentError> {
        Err(gllm_types::SubagentError::Failed("sub-agents may not spawn further sub-agents".into()))
    }
}

/// Drives one agent turn to completion in quiet, auto-approving,
/// no-persistence mode, for use as a sub-agent's [`AgentRunner`].
struct DriverAgentRunner {
    config: Arc<GllmConfig>,
    secrets: ProviderSecrets,
    workspace_root: PathBuf,
    shared_state: Arc<SharedState>,
    skills_dir: PathBuf,
    memory_dir: PathBuf,
    output_dir: PathBuf,
    next_id: AtomicU64,
}

#[async_trait]
impl AgentRunner for DriverAgentRunner {
    async fn run(&self, agent_name: &str, system_prompt: &str, instruction: &str, cancellation: &CancellationToken) -> Result<String, gllm_types::SubagentError> {
        let agent_cfg = self.config.agents.get(agent_name).ok_or_else(|| gllm_types::SubagentError::ConfigNotFound(agent_name.to_string()))?;

        let provider = AnyProvider::new(agent_cfg.provider, &self.secrets).map_err(|e| gllm_types::SubagentError::Failed(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let store = Arc::new(ConversationStore::new(self.output_dir.join(format!("task-{id}.jsonl")), Dialect::Generic));
        store.append(Message::user(instruction)).await.map_err(|e| gllm_types::SubagentError::Failed(e.to_string()))?;

        let null_catalog: Arc<dyn AgentCatalog> = Arc::new(ConfigCatalog(self.config.clone()));
        let null_memory: Arc<dyn MemoryProvider> = Arc::new(FileMemoryProvider(self.memory_dir.join(format!("{agent_name}.md"))));
        let inert_executor = Arc::new(SubagentExecutor::new(self.shared_state.clone(), Arc::new(NullAgentRunner), null_catalog, null_memory, self.output_dir.join("nested")));

        let directory: Arc<dyn AgentDirectory> = Arc::new(ConfigAgentDirectory::new(&self.config));
        let tools = build_tool_registry(agent_name, agent_cfg, &self.workspace_root, self.shared_state.clone(), directory, inert_executor, self.memory_dir.join(format!("{agent_name}.md")), self.skills_dir.clone())
            .await
            .map_err(|e| gllm_types::SubagentError::Failed(e.to_string()))?;

        let driver_config = DriverConfig {
            model: agent_cfg.model.clone(),
            system: Some(SystemPrompt::Text(system_prompt.to_string())),
            carries_system_in_history: false,
            max_recursions: agent_cfg.max_recursions,
            thinking: agent_cfg.think,
            temperature: None,
            top_p: None,
            limits: gllm_limits::lookup(&agent_cfg.model),
            buffer: 0.1,
        };

        let driver = Driver::new(provider, tools, store, driver_config);
        let ui = QuietUi::default();
        driver.run_turn(&ui, cancellation).await.map(|outcome| outcome.final_text).map_err(|e| gllm_types::SubagentError::Failed(e.to_string()))
    }
}

/// Registers the full built-in tool inventory for `agent_name`, then
/// restricts it to `agent_cfg.tools` (when non-empty) and gates
/// `web_search` on `agent_cfg.search`.
async fn build_tool_registry(
    agent_name: &str,
    agent_cfg: &AgentConfig,
    workspace_root: &Path,
    shared_state: Arc<SharedState>,
    agent_directory: Arc<dyn AgentDirectory>,
    subagent_executor: Arc<SubagentExecutor>,
    memory_path: PathBuf,
    skills_dir: PathBuf,
) -> Result<ToolRegistry, gllm_types::ToolError> {
    let mut full = ToolRegistry::new();
    let config = BuiltinToolsConfig {
        workspace_root: workspace_root.to_path_buf(),
        memory_path,
        skills_dir,
        shared_state,
        agent_name: agent_name.to_string(),
        confirmer: Arc::new(AutoApprove),
        need_confirm: true,
        auto_approve: false,
        agent_directory,
        subagent_executor,
        shell_timeout: std::time::Duration::from_secs(120),
        brave_api_key: std::env::var("BRAVE_API_KEY").ok(),
        mcp_clients: Vec::new(),
    };
    gllm_tool::builtin::register_builtin_tools(&mut full, config).await?;

    if agent_cfg.tools.is_empty() && agent_cfg.search {
        return Ok(full);
    }

    let mut filtered = ToolRegistry::new();
    for tool in full.iter() {
        let name = tool.name();
        if name == "web_search" && !agent_cfg.search {
            continue;
        }
        if !agent_cfg.tools.is_empty() && name != "web_search" && !agent_cfg.tools.iter().any(|t| t == name) {
            continue;
        }
        filtered.register(tool.clone());
    }
    Ok(filtered)
}

/// A running session: one configuration, one conversation, one active
/// agent at a time.
pub struct Session {
    config: Arc<GllmConfig>,
    secrets: ProviderSecrets,
    workspace_root: PathBuf,
    shared_state: Arc<SharedState>,
    store: Arc<ConversationStore>,
    directory: Arc<ConfigAgentDirectory>,
    memory_dir: PathBuf,
    skills_dir: PathBuf,
    output_dir: PathBuf,
}

impl Session {
    /// Build a session rooted at `workspace_root`, persisting conversation
    /// and sub-agent state under `state_dir`.
    pub fn new(config: GllmConfig, workspace_root: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        let config = Arc::new(config);
        let state_dir = state_dir.into();
        let directory = Arc::new(ConfigAgentDirectory::new(&config));
        let store = Arc::new(ConversationStore::new(state_dir.join("conversation.jsonl"), Dialect::Generic));
        Self {
            skills_dir: config.skills_dir.clone(),
            secrets: ProviderSecrets::from_env(),
            workspace_root: workspace_root.into(),
            shared_state: Arc::new(SharedState::new()),
            memory_dir: state_dir.join("memory"),
            output_dir: state_dir.join("subagents"),
            store,
            directory,
            config,
        }
    }

    /// The currently active agent's name.
    #[must_use]
    pub fn active_agent(&self) -> String {
        self.directory.active()
    }

    /// The conversation store backing this session.
    #[must_use]
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    fn subagent_runner(&self) -> Arc<DriverAgentRunner> {
        Arc::new(DriverAgentRunner {
            config: self.config.clone(),
            secrets: self.secrets.clone(),
            workspace_root: self.workspace_root.clone(),
            shared_state: self.shared_state.clone(),
            skills_dir: self.skills_dir.clone(),
            memory_dir: self.memory_dir.clone(),
            output_dir: self.output_dir.clone(),
            next_id: AtomicU64::new(0),
        })
    }

    async fn run_turn_as(&self, agent_name: &str, ui: &dyn Ui, cancellation: &CancellationToken) -> Result<TurnOutcome, DriverError> {
        // Invariant: `agent_name` only ever comes from `self.directory`, which is
        // seeded from `self.config.agents` and only ever updated to a name the
        // `switch_agent` tool already validated with `AgentDirectory::exists`.
        let agent_cfg = self.config.agents.get(agent_name).expect("agent directory only names agents present in config");
        let provider = AnyProvider::new(agent_cfg.provider, &self.secrets).map_err(DriverError::Provider)?;

        let catalog: Arc<dyn AgentCatalog> = Arc::new(ConfigCatalog(self.config.clone()));
        let memory: Arc<dyn MemoryProvider> = Arc::new(FileMemoryProvider(self.memory_dir.join(format!("{agent_name}.md"))));
        let executor = Arc::new(
            SubagentExecutor::new(self.shared_state.clone(), self.subagent_runner(), catalog, memory, self.output_dir.clone())
                .with_max_workers(5),
        );

        let tools = build_tool_registry(
            agent_name,
            agent_cfg,
            &self.workspace_root,
            self.shared_state.clone(),
            self.directory.clone(),
            executor,
            self.memory_dir.join(format!("{agent_name}.md")),
            self.skills_dir.clone(),
        )
        .await
        .expect("built-in tool registration only fails via MCP discovery, and no MCP clients are configured here");

        let system = self.config.system_prompt_for(agent_name).map(SystemPrompt::Text);
        let driver_config = DriverConfig {
            model: agent_cfg.model.clone(),
            system,
            carries_system_in_history: false,
            max_recursions: agent_cfg.max_recursions,
            thinking: agent_cfg.think,
            temperature: None,
            top_p: None,
            limits: gllm_limits::lookup(&agent_cfg.model),
            buffer: 0.1,
        };

        let driver = Driver::new(provider, tools, self.store.clone(), driver_config);
        driver.run_turn(ui, cancellation).await
    }

    /// Run one turn as the active agent, following any `switch_agent`
    /// handoffs until a turn completes, fails, or the switch budget
    /// (to guard against two agents handing off to each other forever)
    /// is exhausted.
    pub async fn run_turn(&self, ui: &dyn Ui, cancellation: &CancellationToken) -> Result<TurnOutcome, DriverError> {
        let mut switches = 0;
        loop {
            let active = self.directory.active();
            match self.run_turn_as(&active, ui, cancellation).await {
                Err(DriverError::SwitchAgent { target, follow_up }) => {
                    switches += 1;
                    if switches > MAX_AGENT_SWITCHES {
                        return Err(DriverError::MaxRecursions(MAX_AGENT_SWITCHES));
                    }
                    self.directory.set_active(&target);
                    if let Some(text) = follow_up {
                        self.store.append(Message::user(text)).await?;
                    }
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
agent: default
skills_dir: /tmp/gllm-test-skills
agents:
  default:
    model: gpt-4o-mini
    provider: open_ai
    system_prompt: "You are a helpful assistant."
    description: general purpose
    tools: [read_file, shell]
  researcher:
    model: claude-sonnet-4-20250514
    provider: anthropic
    system_prompt: "You are a careful researcher."
    description: finds things
    search: true
"#;

    fn config() -> GllmConfig {
        GllmConfig::from_yaml(YAML).unwrap()
    }

    #[test]
    fn directory_lists_agents_sorted_with_active_marker() {
        let directory = ConfigAgentDirectory::new(&config());
        assert_eq!(directory.active(), "default");
        let names: Vec<String> = directory.list().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["default".to_string(), "researcher".to_string()]);
        assert!(directory.exists("researcher"));
        assert!(!directory.exists("ghost"));
    }

    #[test]
    fn set_active_moves_the_active_agent() {
        let directory = ConfigAgentDirectory::new(&config());
        directory.set_active("researcher");
        assert_eq!(directory.active(), "researcher");
    }

    #[tokio::test]
    async fn tool_registry_is_restricted_to_the_agents_configured_tools() {
        let config = config();
        let agent_cfg = config.agents.get("default").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let directory: Arc<dyn AgentDirectory> = Arc::new(ConfigAgentDirectory::new(&config));
        let shared_state = Arc::new(SharedState::new());
        let catalog: Arc<dyn AgentCatalog> = Arc::new(ConfigCatalog(Arc::new(config.clone())));
        let memory: Arc<dyn MemoryProvider> = Arc::new(FileMemoryProvider(tmp.path().join("default.md")));
        let executor = Arc::new(SubagentExecutor::new(shared_state.clone(), Arc::new(NullAgentRunner), catalog, memory, tmp.path().join("subagents")));

        let tools = build_tool_registry(
            "default",
            agent_cfg,
            tmp.path(),
            shared_state,
            directory,
            executor,
            tmp.path().join("default.md"),
            tmp.path().join("skills"),
        )
        .await
        .unwrap();

        assert!(tools.get("read_file").is_some());
        assert!(tools.get("shell").is_some());
        assert!(tools.get("write_file").is_none());
        assert!(tools.get("web_search").is_none());
    }

    #[tokio::test]
    async fn search_enabled_agent_without_an_explicit_tool_list_keeps_web_search() {
        let config = config();
        let agent_cfg = config.agents.get("researcher").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let directory: Arc<dyn AgentDirectory> = Arc::new(ConfigAgentDirectory::new(&config));
        let shared_state = Arc::new(SharedState::new());
        let catalog: Arc<dyn AgentCatalog> = Arc::new(ConfigCatalog(Arc::new(config.clone())));
        let memory: Arc<dyn MemoryProvider> = Arc::new(FileMemoryProvider(tmp.path().join("researcher.md")));
        let executor = Arc::new(SubagentExecutor::new(shared_state.clone(), Arc::new(NullAgentRunner), catalog, memory, tmp.path().join("subagents")));

        let tools = build_tool_registry(
            "researcher",
            agent_cfg,
            tmp.path(),
            shared_state,
            directory,
            executor,
            tmp.path().join("researcher.md"),
            tmp.path().join("skills"),
        )
        .await
        .unwrap();

        assert!(tools.get("web_search").is_some());
        assert!(tools.get("read_file").is_some());
    }

    #[test]
    fn session_new_starts_on_the_configured_active_agent() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::new(config(), tmp.path().join("workspace"), tmp.path().join("state"));
        assert_eq!(session.active_agent(), "default");
    }
}
