//! Mapping proposals from a chat-completions model
//!
//! The proposer only produces text. Whatever comes back is untrusted and goes
//! through [`parse_mapping`](crate::mapping::parse_mapping) like any hand-written table.

use crate::error::{Result, TranslateError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Something that can suggest a mapping between a source and a target schema
pub trait MappingProposer {
    /// Return raw mapping text for the two schemas
    fn propose(&self, source_schema: &str, target_schema: &str) -> Result<String>;
}

/// Build the instruction sent to the model
pub fn build_prompt(source_schema: &str, target_schema: &str) -> String {
    format!(
        r#"You will generate a FLAT mapping between a JSON Schema (source) and an XML XSD (target).
IMPORTANT:
- JSON side: use dotted JSON paths without root, like: "customerId", "address.line1"
- XML side: use FULL XML paths including the XML root element, using dot notation, like: "CustomerRequest.CustID", "CustomerRequest.BasicInfo.Name"
- Output ONLY JSON of the form:
{{
    "json.path": "XmlRoot.XmlChild.XmlGrandChild",
    ...
}}

JSON Schema (source):
{}
XML XSD (target):
{}
Return ONLY the mapping JSON, nothing else."#,
        source_schema.trim(),
        target_schema.trim()
    )
}

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct ProposerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl ProposerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ProposerConfig {
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            model: String::from(DEFAULT_MODEL),
            timeout_secs: 60,
        }
    }

    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TranslateError::Proposer("OPENAI_API_KEY is not set".to_string()))?;

        let mut config = ProposerConfig::new(api_key);
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Proposer backed by the chat-completions API. One request, no retries.
pub struct OpenAiProposer {
    client: reqwest::blocking::Client,
    config: ProposerConfig,
}

impl OpenAiProposer {
    pub fn new(config: ProposerConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(OpenAiProposer { client, config })
    }
}

impl MappingProposer for OpenAiProposer {
    fn propose(&self, source_schema: &str, target_schema: &str) -> Result<String> {
        let prompt = build_prompt(source_schema, target_schema);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
        };

        info!(model = %self.config.model, "requesting mapping proposal");
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(TranslateError::Proposer(format!(
                "request failed with status {}: {}",
                status,
                body.trim()
            )));
        }

        extract_reply(&body)
    }
}

/// Pull the first choice's text out of a chat-completions response body
fn extract_reply(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| TranslateError::Proposer(format!("unreadable response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| TranslateError::Proposer("response contained no mapping".to_string()))
}
