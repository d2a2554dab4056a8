//! Filesystem tools: read, write, edit, and directory management.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;

use gllm_types::ToolError;
use serde_json::{json, Value};

use crate::confirm::{line_diff, require_confirmation, Confirmer};
use crate::ToolDyn;

const MAX_READ_BYTES: u64 = 20 * 1024 * 1024;

fn too_large(path: &Path) -> ToolError {
    ToolError::ExecutionFailed(format!("{} exceeds the 20 MiB read limit", path.display()).into())
}

fn invalid(msg: impl Into<String>) -> ToolError {
    ToolError::InvalidInput(msg.into())
}

fn exec_failed(msg: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed(msg.into().into())
}

fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input.get(field).and_then(Value::as_str).ok_or_else(|| invalid(format!("missing required field: {field}")))
}

fn number_lines(content: &str) -> String {
    content.lines().enumerate().map(|(i, line)| format!("{:4} | {line}", i + 1)).collect::<Vec<_>>().join("\n")
}

async fn read_checked(path: &Path) -> Result<String, ToolError> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| exec_failed(e.to_string()))?;
    if meta.len() > MAX_READ_BYTES {
        return Err(too_large(path));
    }
    let bytes = tokio::fs::read(path).await.map_err(|e| exec_failed(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Shared configuration every filesystem tool resolves paths and
/// confirmation prompts against.
pub struct FsConfig {
    /// Directory relative paths are resolved against.
    pub root: PathBuf,
    /// Confirmation gate for destructive operations.
    pub confirmer: Arc<dyn Confirmer>,
    /// Whether destructive operations require confirmation at all.
    pub need_confirm: bool,
    /// When true, skips confirmation regardless of `need_confirm`.
    pub auto_approve: bool,
}

impl FsConfig {
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

macro_rules! boxed_call {
    ($body:expr) => {
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin($body(self, input))
        }
    };
}

/// `read_file`
pub struct ReadFileTool(pub Arc<FsConfig>);

impl ToolDyn for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }
    fn description(&self) -> &str {
        "Read a file's contents, prefixed with 1-based line numbers. Refuses files over 20 MiB."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let resolved = this.0.resolve(path);
        let content = read_checked(&resolved).await?;
        Ok(Value::String(number_lines(&content)))
    });
}

/// `read_multiple_files`
pub struct ReadMultipleFilesTool(pub Arc<FsConfig>);

impl ToolDyn for ReadMultipleFilesTool {
    fn name(&self) -> &str {
        "read_multiple_files"
    }
    fn description(&self) -> &str {
        "Read several files at once, each prefixed with its path and 1-based line numbers."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"paths": {"type": "array", "items": {"type": "string"}}}, "required": ["paths"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let paths = input.get("paths").and_then(Value::as_array).ok_or_else(|| invalid("missing required field: paths"))?;
        let mut sections = Vec::with_capacity(paths.len());
        for p in paths {
            let p = p.as_str().ok_or_else(|| invalid("paths must be strings"))?;
            let resolved = this.0.resolve(p);
            match read_checked(&resolved).await {
                Ok(content) => sections.push(format!("=== {p} ===\n{}", number_lines(&content))),
                Err(e) => sections.push(format!("=== {p} ===\nerror: {e}")),
            }
        }
        Ok(Value::String(sections.join("\n\n")))
    });
}

/// `write_file`
pub struct WriteFileTool(pub Arc<FsConfig>);

impl ToolDyn for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "Write (overwriting) a file's entire contents."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}, "content": {"type": "string"}}, "required": ["path", "content"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let content = required_str(&input, "content")?;
        let resolved = this.0.resolve(path);
        let previous = tokio::fs::read_to_string(&resolved).await.unwrap_or_default();
        let diff = line_diff(&previous, content);
        require_confirmation(this.0.confirmer.as_ref(), this.0.need_confirm, this.0.auto_approve, "write_file", &format!("write {path}"), Some(&diff)).await?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| exec_failed(e.to_string()))?;
        }
        tokio::fs::write(&resolved, content).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("wrote {} bytes to {path}", content.len())))
    });
}

/// `edit_file`
pub struct EditFileTool(pub Arc<FsConfig>);

impl ToolDyn for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }
    fn description(&self) -> &str {
        "Apply an ordered list of search/replace substring edits to a file."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "edits": {"type": "array", "items": {"type": "object", "properties": {"search": {"type": "string"}, "replace": {"type": "string"}}, "required": ["search", "replace"]}}
            },
            "required": ["path", "edits"]
        })
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let edits = input.get("edits").and_then(Value::as_array).ok_or_else(|| invalid("missing required field: edits"))?;
        let resolved = this.0.resolve(path);
        let original = read_checked(&resolved).await?;
        let mut content = original.clone();
        let mut applied = 0usize;
        let mut unmatched = Vec::new();
        for edit in edits {
            let search = edit.get("search").and_then(Value::as_str).ok_or_else(|| invalid("edit missing 'search'"))?;
            let replace = edit.get("replace").and_then(Value::as_str).ok_or_else(|| invalid("edit missing 'replace'"))?;
            let count = content.matches(search).count();
            if count == 0 {
                let truncated: String = search.chars().take(50).collect();
                unmatched.push(truncated);
                continue;
            }
            applied += count;
            content = content.replace(search, replace);
        }
        let diff = line_diff(&original, &content);
        require_confirmation(this.0.confirmer.as_ref(), this.0.need_confirm, this.0.auto_approve, "edit_file", &format!("edit {path}"), Some(&diff)).await?;
        tokio::fs::write(&resolved, &content).await.map_err(|e| exec_failed(e.to_string()))?;
        let mut summary = format!("applied {applied} replacement(s) in {path}");
        if !unmatched.is_empty() {
            summary.push_str(&format!("; unmatched patterns: {}", unmatched.join(", ")));
        }
        Ok(Value::String(summary))
    });
}

/// `create_directory`
pub struct CreateDirectoryTool(pub Arc<FsConfig>);

impl ToolDyn for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }
    fn description(&self) -> &str {
        "Create a directory, including any missing parent directories."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let resolved = this.0.resolve(path);
        tokio::fs::create_dir_all(&resolved).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("created {path}")))
    });
}

/// `list_directory`
pub struct ListDirectoryTool(pub Arc<FsConfig>);

impl ToolDyn for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }
    fn description(&self) -> &str {
        "List a directory's immediate entries, directories first, alphabetically."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let resolved = this.0.resolve(path);
        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&resolved).await.map_err(|e| exec_failed(e.to_string()))?;
        while let Some(entry) = reader.next_entry().await.map_err(|e| exec_failed(e.to_string()))? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push((is_dir, entry.file_name().to_string_lossy().into_owned()));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        let lines: Vec<String> = entries.into_iter().map(|(is_dir, name)| if is_dir { format!("{name}/") } else { name }).collect();
        Ok(Value::String(lines.join("\n")))
    });
}

/// `delete_file`
pub struct DeleteFileTool(pub Arc<FsConfig>);

impl ToolDyn for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }
    fn description(&self) -> &str {
        "Delete a single file."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let resolved = this.0.resolve(path);
        require_confirmation(this.0.confirmer.as_ref(), this.0.need_confirm, this.0.auto_approve, "delete_file", &format!("delete {path}"), None).await?;
        tokio::fs::remove_file(&resolved).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("deleted {path}")))
    });
}

/// `delete_directory`
pub struct DeleteDirectoryTool(pub Arc<FsConfig>);

impl ToolDyn for DeleteDirectoryTool {
    fn name(&self) -> &str {
        "delete_directory"
    }
    fn description(&self) -> &str {
        "Recursively delete a directory and everything under it."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let resolved = this.0.resolve(path);
        require_confirmation(this.0.confirmer.as_ref(), this.0.need_confirm, this.0.auto_approve, "delete_directory", &format!("recursively delete {path}"), None).await?;
        tokio::fs::remove_dir_all(&resolved).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("deleted {path}")))
    });
}

/// `move`
pub struct MoveTool(pub Arc<FsConfig>);

impl ToolDyn for MoveTool {
    fn name(&self) -> &str {
        "move"
    }
    fn description(&self) -> &str {
        "Move or rename a file or directory."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"from": {"type": "string"}, "to": {"type": "string"}}, "required": ["from", "to"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let from = required_str(&input, "from")?;
        let to = required_str(&input, "to")?;
        let resolved_from = this.0.resolve(from);
        let resolved_to = this.0.resolve(to);
        require_confirmation(this.0.confirmer.as_ref(), this.0.need_confirm, this.0.auto_approve, "move", &format!("move {from} to {to}"), None).await?;
        if let Some(parent) = resolved_to.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| exec_failed(e.to_string()))?;
        }
        tokio::fs::rename(&resolved_from, &resolved_to).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("moved {from} to {to}")))
    });
}

/// `copy`
pub struct CopyTool(pub Arc<FsConfig>);

impl ToolDyn for CopyTool {
    fn name(&self) -> &str {
        "copy"
    }
    fn description(&self) -> &str {
        "Copy a file."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"from": {"type": "string"}, "to": {"type": "string"}}, "required": ["from", "to"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let from = required_str(&input, "from")?;
        let to = required_str(&input, "to")?;
        let resolved_from = this.0.resolve(from);
        let resolved_to = this.0.resolve(to);
        if let Some(parent) = resolved_to.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| exec_failed(e.to_string()))?;
        }
        tokio::fs::copy(&resolved_from, &resolved_to).await.map_err(|e| exec_failed(e.to_string()))?;
        Ok(Value::String(format!("copied {from} to {to}")))
    });
}

const SEARCH_IGNORED: &[&str] = &[".git", "node_modules"];

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if SEARCH_IGNORED.contains(&name.as_str()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// `search_files`
pub struct SearchFilesTool(pub Arc<FsConfig>);

impl ToolDyn for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }
    fn description(&self) -> &str {
        "Find files under the workspace whose path matches a pattern (regex, falling back to a literal substring)."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"pattern": {"type": "string"}}, "required": ["pattern"]})
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let pattern = required_str(&input, "pattern")?.to_string();
        let root = this.0.root.clone();
        let matches = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ToolError> {
            let mut files = Vec::new();
            walk_files(&root, &mut files).map_err(|e| exec_failed(e.to_string()))?;
            let regex = regex::Regex::new(&pattern).ok();
            let mut matched = Vec::new();
            for path in files {
                let display = path.strip_prefix(&root).unwrap_or(&path).to_string_lossy().into_owned();
                let hit = regex.as_ref().map(|r| r.is_match(&display)).unwrap_or_else(|| display.contains(&pattern));
                if hit {
                    matched.push(display);
                }
            }
            matched.sort();
            Ok(matched)
        })
        .await
        .map_err(|e| exec_failed(e.to_string()))??;
        Ok(Value::String(matches.join("\n")))
    });
}

/// `search_text_in_file`
pub struct SearchTextInFileTool(pub Arc<FsConfig>);

impl ToolDyn for SearchTextInFileTool {
    fn name(&self) -> &str {
        "search_text_in_file"
    }
    fn description(&self) -> &str {
        "Search a file's lines for a pattern; optionally case-insensitive or regex."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "pattern": {"type": "string"},
                "case_insensitive": {"type": "boolean"},
                "regex": {"type": "boolean"}
            },
            "required": ["path", "pattern"]
        })
    }
    boxed_call!(|this: &Self, input: Value| async move {
        let path = required_str(&input, "path")?;
        let pattern = required_str(&input, "pattern")?;
        let case_insensitive = input.get("case_insensitive").and_then(Value::as_bool).unwrap_or(false);
        let use_regex = input.get("regex").and_then(Value::as_bool).unwrap_or(false);
        let resolved = this.0.resolve(path);
        let content = read_checked(&resolved).await?;

        let regex = if use_regex {
            let pattern = if case_insensitive { format!("(?i){pattern}") } else { pattern.to_string() };
            Some(regex::Regex::new(&pattern).map_err(|e| invalid(format!("invalid regex: {e}")))?)
        } else {
            None
        };

        let mut hits = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let matched = if let Some(re) = &regex {
                re.is_match(line)
            } else if case_insensitive {
                line.to_lowercase().contains(&pattern.to_lowercase())
            } else {
                line.contains(pattern)
            };
            if matched {
                hits.push(format!("{}: {line}", i + 1));
            }
        }
        let count = hits.len();
        Ok(Value::String(format!("{count} match(es)\n{}", hits.join("\n"))))
    });
}
