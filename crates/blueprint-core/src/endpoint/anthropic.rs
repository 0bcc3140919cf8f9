//! Direct calls to the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    EndpointCall, EndpointError, EndpointReply, GenerationEndpoint, Usage, truncate_body,
};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone)]
pub struct AnthropicEndpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicEndpoint {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, EndpointError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EndpointError::MissingApiKey);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationEndpoint for AnthropicEndpoint {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: call.system,
            messages: [Message {
                role: "user",
                content: call.prompt,
            }],
        };

        debug!(model = %self.model, section = call.kind.as_str(), "calling messages API");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(EndpointError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "messages API returned an error status");
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body: truncate_body(&text, 500),
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| EndpointError::Parse(e.to_string()))?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return Err(EndpointError::EmptyResponse);
        }

        Ok(EndpointReply {
            text,
            model: parsed.model.or_else(|| Some(self.model.clone())),
            usage: parsed.usage,
        })
    }
}
