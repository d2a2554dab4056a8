//! Typed configuration for agents, providers, and prompt templates.
//!
//! Configuration is loaded as YAML into [`GllmConfig`], a strongly-typed
//! replacement for an untyped key/value map. System prompts and templates
//! can be written inline or by reference; [`TemplateRef`] picks between the
//! two at parse time based on whether the raw string contains whitespace —
//! a bare word is a name into the `templates`/`system_prompts` table, a
//! string with spaces is the prompt itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gllm_types::ThinkingLevel;
use serde::{Deserialize, Deserializer};

/// Failure to load or resolve a [`GllmConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's YAML was malformed or didn't match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The config's `agent` field names an agent absent from `agents`.
    #[error("active agent {0:?} is not defined in `agents`")]
    UnknownActiveAgent(String),
}

/// A prompt or template that is either written out inline or looked up by
/// name in a side table.
///
/// Deserialized from a plain string: a value containing whitespace is taken
/// to be the prompt text itself ([`TemplateRef::Inline`]); a single bare
/// word is taken to be a key into the config's `templates` or
/// `system_prompts` table ([`TemplateRef::Named`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// The prompt text, written directly in the agent's config entry.
    Inline(String),
    /// A key to resolve against a template table.
    Named(String),
}

impl TemplateRef {
    /// Classify `raw` as inline text or a table reference.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.chars().any(char::is_whitespace) {
            TemplateRef::Inline(raw)
        } else {
            TemplateRef::Named(raw)
        }
    }

    /// Resolve against `table`, falling back to the name itself for an
    /// unresolved [`TemplateRef::Named`] so a typo surfaces as odd prompt
    /// text rather than a hard failure.
    #[must_use]
    pub fn resolve<'a>(&'a self, table: &'a HashMap<String, String>) -> &'a str {
        match self {
            TemplateRef::Inline(text) => text,
            TemplateRef::Named(name) => table.get(name).map(String::as_str).unwrap_or(name),
        }
    }
}

impl<'de> Deserialize<'de> for TemplateRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TemplateRef::parse(raw))
    }
}

/// Which provider family an agent talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI Chat Completions.
    OpenAi,
    /// Anthropic Messages.
    Anthropic,
    /// Google Gemini `generateContent`.
    Gemini,
}

fn default_max_recursions() -> usize {
    25
}

fn default_think() -> ThinkingLevel {
    ThinkingLevel::Off
}

/// One agent's configuration: model, provider, prompts, and capabilities.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Model identifier passed to the provider, e.g. `"gpt-4o-mini"`.
    pub model: String,
    /// Which provider family serves this agent.
    pub provider: ProviderKind,
    /// The agent's system prompt, inline or by reference.
    pub system_prompt: TemplateRef,
    /// An optional template appended after the resolved system prompt,
    /// e.g. for a shared "house style" block reused across agents.
    #[serde(default)]
    pub template: Option<TemplateRef>,
    /// Maximum number of tool-calling recursions before a turn is aborted.
    #[serde(default = "default_max_recursions")]
    pub max_recursions: usize,
    /// Names of built-in tools this agent may call. Empty means all.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Names of configured MCP servers this agent may reach.
    #[serde(default)]
    pub mcp: Vec<String>,
    /// Reasoning effort requested of the model.
    #[serde(default = "default_think")]
    pub think: ThinkingLevel,
    /// Whether this agent may use the web-search tool.
    #[serde(default)]
    pub search: bool,
    /// Whether usage accounting is surfaced to the UI for this agent.
    #[serde(default)]
    pub usage: bool,
    /// Whether the agent's replies should be treated as markdown.
    #[serde(default)]
    pub markdown: bool,
    /// Free-form capability tags consulted by the host application.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// A one-line description shown by the agent-directory tools.
    #[serde(default)]
    pub description: String,
}

/// Top-level configuration for a `gllm` session.
#[derive(Debug, Clone, Deserialize)]
pub struct GllmConfig {
    /// All configured agents, keyed by name.
    pub agents: HashMap<String, AgentConfig>,
    /// The agent active at session start.
    pub agent: String,
    /// Named templates, resolved by [`TemplateRef::Named`].
    #[serde(default)]
    pub templates: HashMap<String, String>,
    /// Named system prompts, resolved by [`TemplateRef::Named`].
    #[serde(default)]
    pub system_prompts: HashMap<String, String>,
    /// Directory scanned for skill manifests.
    pub skills_dir: PathBuf,
}

impl GllmConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: GllmConfig = serde_yaml::from_str(raw)?;
        if !config.agents.contains_key(&config.agent) {
            return Err(ConfigError::UnknownActiveAgent(config.agent.clone()));
        }
        Ok(config)
    }

    /// Load and parse configuration from a YAML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_yaml(&raw)
    }

    /// Resolve an agent's full system prompt: its `system_prompt`, with its
    /// `template` (if any) appended after a blank line.
    #[must_use]
    pub fn system_prompt_for(&self, agent_name: &str) -> Option<String> {
        let agent = self.agents.get(agent_name)?;
        let mut prompt = agent.system_prompt.resolve(&self.system_prompts).to_string();
        if let Some(template) = &agent.template {
            prompt.push_str("\n\n");
            prompt.push_str(template.resolve(&self.templates));
        }
        Some(prompt)
    }
}
