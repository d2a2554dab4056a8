//! The UI collaborator boundary: status notifications, streamed data, and
//! the proceed-acknowledgement the driver blocks on before finishing a turn.

use async_trait::async_trait;
use serde_json::Value;

/// A turn status change, delivered over the notify channel.
///
/// Mirrors the turn state machine: `Idle → Processing → Streaming →
/// (Reasoning? → Streaming)* → (ToolCalling → ToolCallingOver)* →
/// (Finished | Aborted)`.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Status {
    /// The driver has started assembling the request.
    Processing,
    /// The streaming response has opened.
    Started,
    /// A thinking/reasoning block has begun.
    Reasoning,
    /// The current thinking/reasoning block has ended.
    ReasoningOver,
    /// A tool is about to run, with filtered, displayable arguments (bulky
    /// fields such as `content`/`edits` are dropped before this is sent).
    FunctionCalling {
        /// The tool being invoked.
        name: String,
        /// Displayable arguments.
        args: Value,
    },
    /// The tool call just reported on has finished.
    FunctionCallingOver,
    /// A non-fatal warning (context truncation, a tool error that didn't
    /// abort the turn, an unknown tool name).
    Warn(String),
    /// The turn completed normally.
    Finished,
    /// The turn ended early (cancellation, a fatal stream error).
    Aborted(String),
}

/// A chunk of streamed output, delivered over the data channel.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DataEvent {
    /// A chunk of assistant-visible text.
    TextDelta(String),
    /// A chunk of reasoning/thinking text.
    ReasoningDelta(String),
    /// Sentinel marking the end of this turn's data.
    Finished,
}

/// The external UI collaborator: `NotifyChan` (status), `DataChan` (stream
/// deltas), and `ProceedChan` (ack). The driver blocks on
/// [`Ui::await_proceed`] after `DataEvent::Finished` before signalling
/// [`Status::Finished`] and returning.
#[async_trait]
pub trait Ui: Send + Sync {
    /// Send a status change.
    async fn notify(&self, status: Status);

    /// Send a chunk of streamed data.
    async fn data(&self, event: DataEvent);

    /// Block until the UI acknowledges it has consumed the turn's data.
    async fn await_proceed(&self);
}

/// A [`Ui`] that discards every notification and proceeds immediately.
/// Used by sub-agent runs (`quiet + auto-approve` mode).
#[derive(Default)]
pub struct QuietUi;

#[async_trait]
impl Ui for QuietUi {
    async fn notify(&self, _status: Status) {}
    async fn data(&self, _event: DataEvent) {}
    async fn await_proceed(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingUi {
        statuses: Mutex<Vec<Status>>,
    }

    #[async_trait]
    impl Ui for RecordingUi {
        async fn notify(&self, status: Status) {
            self.statuses.lock().unwrap().push(status);
        }
        async fn data(&self, _event: DataEvent) {}
        async fn await_proceed(&self) {}
    }

    #[tokio::test]
    async fn quiet_ui_never_blocks() {
        let ui = QuietUi;
        ui.notify(Status::Processing).await;
        ui.data(DataEvent::TextDelta("hi".into())).await;
        ui.await_proceed().await;
    }

    #[tokio::test]
    async fn recording_ui_captures_statuses_in_order() {
        let ui = RecordingUi::default();
        ui.notify(Status::Processing).await;
        ui.notify(Status::Started).await;
        ui.notify(Status::Finished).await;
        let statuses = ui.statuses.lock().unwrap();
        assert_eq!(*statuses, vec![Status::Processing, Status::Started, Status::Finished]);
    }
}
