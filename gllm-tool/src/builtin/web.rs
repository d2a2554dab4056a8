//! `web_fetch` and `web_search`: read-only network access tools.

use std::pin::Pin;
use std::future::Future;
use std::time::Duration;

use gllm_types::ToolError;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use tracing::debug;

use crate::ToolDyn;

const DEFAULT_MAX_CHARS: usize = 50_000;

fn exec_failed(msg: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed(msg.into().into())
}

/// Fetches a URL and returns readable text, converting HTML to plain text
/// and pretty-printing JSON. Read-only, no authentication support.
#[derive(Default)]
pub struct WebFetchTool;

impl ToolDyn for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }
    fn description(&self) -> &str {
        "Fetch content from an http/https URL and convert it to readable text. \
         HTML is converted to plain text, JSON is pretty-printed. No authentication, \
         read-only, limited to 50,000 characters by default."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "The URL to fetch (http or https)"},
                "max_chars": {"type": "integer", "description": "Maximum characters to return (default 50000)"}
            },
            "required": ["url"]
        })
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let url = input.get("url").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: url".into()))?;
            let max_chars = input.get("max_chars").and_then(Value::as_u64).unwrap_or(DEFAULT_MAX_CHARS as u64) as usize;

            debug!(url, "web_fetch");
            fetch_url(url, max_chars).await.map(Value::String)
        })
    }
}

async fn fetch_url(url: &str, max_chars: usize) -> Result<String, ToolError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(3))
        .user_agent(concat!("gllm-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| exec_failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| exec_failed(e.to_string()))?;
    let content_type = response.headers().get("content-type").and_then(|v| v.to_str().ok()).unwrap_or("").to_lowercase();
    let body = response.text().await.map_err(|e| exec_failed(e.to_string()))?;

    let content = if content_type.contains("html") {
        html2text::from_read(body.as_bytes(), 100)
    } else if content_type.contains("json") {
        serde_json::from_str::<Value>(&body).ok().and_then(|v| serde_json::to_string_pretty(&v).ok()).unwrap_or(body)
    } else {
        body
    };

    if content.len() > max_chars {
        Ok(format!("{}...[truncated at {max_chars} chars; total {} chars]", &content[..max_chars], content.len()))
    } else {
        Ok(content)
    }
}

/// Real-time web search via the Brave Search API. Requires `BRAVE_API_KEY`
/// unless an API key is configured on the struct.
#[derive(Default)]
pub struct WebSearchTool {
    /// Optional API key override; falls back to the `BRAVE_API_KEY` env var.
    pub api_key: Option<String>,
}

impl ToolDyn for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }
    fn description(&self) -> &str {
        "Real-time web search via the Brave Search API. Requires BRAVE_API_KEY. \
         count: 1-10 (default 5). Cite sources with title and URL after answering."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "count": {"type": "integer", "description": "Number of results to return (default 5, max 10)"}
            },
            "required": ["query"]
        })
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let query = input.get("query").and_then(Value::as_str).ok_or_else(|| ToolError::InvalidInput("missing required field: query".into()))?;
            let count = input.get("count").and_then(Value::as_u64).unwrap_or(5).clamp(1, 10) as usize;

            let api_key = self.api_key.clone().or_else(|| std::env::var("BRAVE_API_KEY").ok());
            let Some(api_key) = api_key else {
                return Err(exec_failed("no Brave Search API key configured; set BRAVE_API_KEY"));
            };

            debug!(query, count, "web_search");
            brave_search(query, count, &api_key).await.map(Value::String)
        })
    }
}

async fn brave_search(query: &str, count: usize, api_key: &str) -> Result<String, ToolError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(concat!("gllm-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| exec_failed(e.to_string()))?;

    let encoded_query = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
    let url = format!("https://api.search.brave.com/res/v1/web/search?q={encoded_query}&count={count}");

    let resp = client
        .get(&url)
        .header("Accept", "application/json")
        .header("Accept-Encoding", "gzip")
        .header("X-Subscription-Token", api_key)
        .send()
        .await
        .map_err(|e| exec_failed(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(exec_failed(format!("Brave API returned status {}", resp.status())));
    }

    let body: Value = resp.json().await.map_err(|e| exec_failed(e.to_string()))?;
    let results = body.get("web").and_then(|w| w.get("results")).and_then(Value::as_array).map(|a| a.as_slice()).unwrap_or(&[]);

    if results.is_empty() {
        return Ok("(no results)".to_string());
    }

    let mut output = Vec::new();
    for (i, r) in results.iter().enumerate().take(count) {
        let title = r.get("title").and_then(Value::as_str).unwrap_or("(no title)");
        let url = r.get("url").and_then(Value::as_str).unwrap_or("");
        let desc = r.get("description").and_then(Value::as_str).unwrap_or("");
        output.push(format!("{}. **{title}**\n   {url}\n   {desc}", i + 1));
    }
    Ok(output.join("\n\n"))
}
