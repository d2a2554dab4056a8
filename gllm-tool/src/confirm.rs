//! Confirmation gate for destructive built-in tools.

use async_trait::async_trait;
use gllm_types::ToolError;

/// Asks a human (or a stand-in) to approve a destructive tool call.
///
/// A real implementation forwards `summary`/`diff` to the UI collaborator
/// and blocks on its response; [`AutoApprove`] is the no-question
/// fallback used in `quiet + auto-approve` contexts such as sub-agent
/// runs.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Ask whether `tool_name` may proceed. `diff`, when present, is shown
    /// alongside `summary` (used by writes/edits).
    async fn confirm(&self, tool_name: &str, summary: &str, diff: Option<&str>) -> bool;
}

/// A confirmer that always approves. Used when `auto_approve` is set.
pub struct AutoApprove;

#[async_trait]
impl Confirmer for AutoApprove {
    async fn confirm(&self, _tool_name: &str, _summary: &str, _diff: Option<&str>) -> bool {
        true
    }
}

/// Run the confirm gate for a destructive tool call.
///
/// Skips the prompt entirely when `need_confirm` is false or
/// `auto_approve` is set; otherwise defers to `confirmer` and turns a
/// decline into the [`ToolError::UserCancel`] sentinel.
pub async fn require_confirmation(confirmer: &dyn Confirmer, need_confirm: bool, auto_approve: bool, tool_name: &str, summary: &str, diff: Option<&str>) -> Result<(), ToolError> {
    if !need_confirm || auto_approve {
        return Ok(());
    }
    if confirmer.confirm(tool_name, summary, diff).await {
        Ok(())
    } else {
        Err(ToolError::UserCancel)
    }
}

/// A crude per-line diff for confirmation previews: lines unique to `new`
/// are marked `+`, lines unique to `old` are marked `-`. Not an aligned
/// diff algorithm — good enough for a human glance before approving.
#[must_use]
pub fn line_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let mut out = String::new();
    let max = old_lines.len().max(new_lines.len());
    for i in 0..max {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(o), Some(n)) if o == n => {
                out.push_str("  ");
                out.push_str(o);
                out.push('\n');
            }
            (Some(o), Some(n)) => {
                out.push_str(&format!("- {o}\n+ {n}\n"));
            }
            (Some(o), None) => out.push_str(&format!("- {o}\n")),
            (None, Some(n)) => out.push_str(&format!("+ {n}\n")),
            (None, None) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysDeny;
    #[async_trait]
    impl Confirmer for AlwaysDeny {
        async fn confirm(&self, _tool_name: &str, _summary: &str, _diff: Option<&str>) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn skips_prompt_when_confirm_not_needed() {
        require_confirmation(&AlwaysDeny, false, false, "write_file", "writes x", None).await.unwrap();
    }

    #[tokio::test]
    async fn skips_prompt_when_auto_approved() {
        require_confirmation(&AlwaysDeny, true, true, "write_file", "writes x", None).await.unwrap();
    }

    #[tokio::test]
    async fn decline_yields_user_cancel() {
        let err = require_confirmation(&AlwaysDeny, true, false, "write_file", "writes x", None).await.unwrap_err();
        assert!(matches!(err, ToolError::UserCancel));
    }

    #[tokio::test]
    async fn approve_proceeds() {
        require_confirmation(&AutoApprove, true, false, "write_file", "writes x", None).await.unwrap();
    }

    #[test]
    fn line_diff_marks_changed_lines() {
        let diff = line_diff("a\nb\nc", "a\nx\nc\nd");
        assert!(diff.contains("- b\n+ x\n"));
        assert!(diff.contains("+ d\n"));
        assert!(diff.contains("  a\n"));
    }
}
