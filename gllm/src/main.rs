//! Demonstration binary wiring a [`gllm::Session`] together end to end.
//!
//! This is explicitly not a CLI: it takes no arguments, reads no stdin, and
//! exists to exercise the ambient stack (config loading, logging, a single
//! turn against whichever provider the active agent names) the way the
//! library crate's own integration tests do, but as a runnable program.

use gllm::config::GllmConfig;
use gllm::session::Session;
use gllm_provider::{DataEvent, Status, Ui};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG: &str = r#"
agent: default
skills_dir: ./skills
system_prompts:
  base: "You are a terse, capable assistant running inside a demo binary."
agents:
  default:
    model: gpt-4o-mini
    provider: open_ai
    system_prompt: base
    description: general purpose demo agent
"#;

/// Prints status/data events to stdout as they arrive.
struct StdoutUi;

#[async_trait::async_trait]
impl Ui for StdoutUi {
    async fn notify(&self, status: Status) {
        println!("[status] {status:?}");
    }

    async fn data(&self, event: DataEvent) {
        if let DataEvent::TextDelta(text) = event {
            print!("{text}");
        }
    }

    async fn await_proceed(&self) {}
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config_path = std::env::var("GLLM_CONFIG").unwrap_or_default();
    let config = if config_path.is_empty() {
        tracing::info!("GLLM_CONFIG not set, using the built-in demo configuration");
        GllmConfig::from_yaml(DEFAULT_CONFIG).expect("built-in demo configuration is valid")
    } else {
        GllmConfig::from_file(&config_path).unwrap_or_else(|e| panic!("failed to load config from {config_path}: {e}"))
    };

    let workspace_root = std::env::current_dir().expect("current directory is readable");
    let state_dir = workspace_root.join(".gllm");
    let session = Session::new(config, workspace_root, state_dir);

    session.store().append(gllm_types::Message::user("Say hello in one short sentence.")).await.expect("appending the seed message cannot fail for a fresh conversation store");

    let ui = StdoutUi;
    let cancellation = CancellationToken::new();
    match session.run_turn(&ui, &cancellation).await {
        Ok(outcome) => {
            println!();
            tracing::info!(turns = outcome.turns_used, input_tokens = outcome.usage.input_tokens, output_tokens = outcome.usage.output_tokens, "turn finished");
        }
        Err(err) => {
            tracing::error!(error = %err, "turn failed");
            std::process::exit(1);
        }
    }
}
