//! The fixed inventory of built-in tools, plus the configuration needed to
//! construct it for a session.

pub mod agent_tools;
pub mod fs;
pub mod mcp_tool;
pub mod memory;
pub mod shell;
pub mod skill_tool;
pub mod state_tools;
pub mod subagent_tool;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gllm_mcp::McpClient;
use gllm_state::SharedState;
use gllm_subagent::SubagentExecutor;

use crate::confirm::Confirmer;
use crate::ToolRegistry;
use agent_tools::AgentDirectory;
use fs::FsConfig;

/// Everything needed to assemble one session's fixed built-in tools.
pub struct BuiltinToolsConfig {
    /// Workspace root filesystem tools resolve paths against.
    pub workspace_root: PathBuf,
    /// Path to this agent's durable memory file.
    pub memory_path: PathBuf,
    /// Directory skills are scanned from.
    pub skills_dir: PathBuf,
    /// The shared blackboard tools publish to and read from.
    pub shared_state: Arc<SharedState>,
    /// The currently running agent's name, recorded as the creator of
    /// anything it publishes to shared state.
    pub agent_name: String,
    /// Confirmation gate for destructive tools.
    pub confirmer: Arc<dyn Confirmer>,
    /// Whether destructive tools require confirmation at all.
    pub need_confirm: bool,
    /// Skips confirmation regardless of `need_confirm`.
    pub auto_approve: bool,
    /// The agent catalog `switch_agent`/`list_agent` operate over.
    pub agent_directory: Arc<dyn AgentDirectory>,
    /// The executor `spawn_subagents` dispatches batches through.
    pub subagent_executor: Arc<SubagentExecutor>,
    /// Timeout for the shell tool's spawned commands.
    pub shell_timeout: Duration,
    /// Optional Brave Search API key override.
    pub brave_api_key: Option<String>,
    /// MCP clients whose tools should be discovered and registered.
    pub mcp_clients: Vec<Arc<dyn McpClient>>,
}

/// Register the entire fixed built-in tool inventory, plus any tools
/// discovered through the configured MCP clients.
pub async fn register_builtin_tools(registry: &mut ToolRegistry, config: BuiltinToolsConfig) -> Result<(), gllm_types::ToolError> {
    let fs_config = Arc::new(FsConfig {
        root: config.workspace_root.clone(),
        confirmer: config.confirmer.clone(),
        need_confirm: config.need_confirm,
        auto_approve: config.auto_approve,
    });

    registry.register(Arc::new(fs::ReadFileTool(fs_config.clone())));
    registry.register(Arc::new(fs::ReadMultipleFilesTool(fs_config.clone())));
    registry.register(Arc::new(fs::WriteFileTool(fs_config.clone())));
    registry.register(Arc::new(fs::EditFileTool(fs_config.clone())));
    registry.register(Arc::new(fs::CreateDirectoryTool(fs_config.clone())));
    registry.register(Arc::new(fs::ListDirectoryTool(fs_config.clone())));
    registry.register(Arc::new(fs::DeleteFileTool(fs_config.clone())));
    registry.register(Arc::new(fs::DeleteDirectoryTool(fs_config.clone())));
    registry.register(Arc::new(fs::MoveTool(fs_config.clone())));
    registry.register(Arc::new(fs::CopyTool(fs_config.clone())));
    registry.register(Arc::new(fs::SearchFilesTool(fs_config.clone())));
    registry.register(Arc::new(fs::SearchTextInFileTool(fs_config)));

    registry.register(Arc::new(shell::ShellTool::new(config.workspace_root.clone(), config.confirmer.clone(), config.need_confirm, config.auto_approve).with_timeout(config.shell_timeout)));

    registry.register(Arc::new(web::WebFetchTool));
    registry.register(Arc::new(web::WebSearchTool { api_key: config.brave_api_key.clone() }));

    registry.register(Arc::new(memory::ListMemoryTool(config.memory_path.clone())));
    registry.register(Arc::new(memory::SaveMemoryTool(config.memory_path)));

    registry.register(Arc::new(state_tools::GetStateTool { state: config.shared_state.clone() }));
    registry.register(Arc::new(state_tools::SetStateTool { state: config.shared_state.clone(), agent_name: config.agent_name }));
    registry.register(Arc::new(state_tools::ListStateTool { state: config.shared_state }));

    registry.register(Arc::new(skill_tool::ActivateSkillTool { skills_dir: config.skills_dir }));

    registry.register(Arc::new(agent_tools::SwitchAgentTool { directory: config.agent_directory.clone() }));
    registry.register(Arc::new(agent_tools::ListAgentTool { directory: config.agent_directory }));

    registry.register(Arc::new(subagent_tool::SpawnSubagentsTool::new(config.subagent_executor)));

    for client in config.mcp_clients {
        for tool in mcp_tool::discover(client).await? {
            registry.register(tool);
        }
    }

    Ok(())
}
