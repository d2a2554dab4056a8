//! Gemini `generateContent` request types.
//!
//! Only request-side types are needed: this provider only ever streams, so
//! responses are parsed directly off the SSE wire in `streaming.rs`.

use serde::Serialize;

/// Gemini `streamGenerateContent` request body.
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Conversation turns.
    pub contents: Vec<GeminiContent>,
    /// System instruction, sent as its own top-level field.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "systemInstruction")]
    pub system_instruction: Option<GeminiContent>,
    /// Function (tool) declarations available to the model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiTool>,
    /// Sampling and thinking configuration.
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

/// One turn of conversation: a role plus its parts.
#[derive(Debug, Serialize)]
pub struct GeminiContent {
    /// Role: "user" or "model". Gemini has no separate "system"/"assistant"/"tool" role;
    /// function responses are sent back as "user" turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The turn's content parts.
    pub parts: Vec<GeminiPart>,
}

/// One piece of content within a turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeminiPart {
    /// Plain text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A function call requested by the model.
    FunctionCall {
        /// The call, nested per Gemini's wire shape.
        function_call: GeminiFunctionCall,
    },
    /// A function's result, sent back to the model.
    FunctionResponse {
        /// The response, nested per Gemini's wire shape.
        function_response: GeminiFunctionResponse,
    },
    /// Inline base64-encoded media.
    InlineData {
        /// The media payload.
        inline_data: GeminiBlob,
    },
    /// Media referenced by URL.
    FileData {
        /// The media reference.
        file_data: GeminiFileData,
    },
}

/// A function call, as Gemini represents it in a response/history part.
#[derive(Debug, Serialize)]
pub struct GeminiFunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments, as a JSON object (Gemini never stringifies them).
    pub args: serde_json::Value,
}

/// A function result sent back to Gemini.
///
/// Gemini correlates function responses to calls by `name`, not by an
/// opaque call ID the way Anthropic/OpenAI do.
#[derive(Debug, Serialize)]
pub struct GeminiFunctionResponse {
    /// Name of the function this responds to.
    pub name: String,
    /// The result, wrapped in an object since Gemini requires a struct here.
    pub response: serde_json::Value,
}

/// Inline base64 media payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiBlob {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// A reference to externally hosted media.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFileData {
    /// MIME type of the referenced file.
    pub mime_type: String,
    /// URI where the file can be fetched.
    pub file_uri: String,
}

/// A tool made available to the model, grouped the way Gemini requires.
#[derive(Debug, Serialize)]
pub struct GeminiTool {
    /// Function declarations in this tool group.
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<GeminiFunctionDeclaration>,
}

/// One function's declared name/description/schema.
#[derive(Debug, Serialize)]
pub struct GeminiFunctionDeclaration {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// JSON Schema for the function parameters.
    pub parameters: serde_json::Value,
}

/// Sampling and extended-thinking configuration.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Extended-thinking budget, derived from `ThinkingLevel`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<GeminiThinkingConfig>,
}

/// Extended-thinking token budget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiThinkingConfig {
    /// Token budget reserved for the model's internal reasoning.
    pub thinking_budget: u32,
}
