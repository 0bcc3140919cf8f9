//! Remote text-generation endpoints.
//!
//! ```text
//! Orchestrator
//!     |
//!     v
//! &dyn GenerationEndpoint --generate(EndpointCall)--> EndpointReply { text, model, usage }
//!     |                                  |
//!     +-- HttpEndpoint (edge function)   +-- EndpointError -> local fallback
//!     +-- AnthropicEndpoint (Messages API)
//! ```

pub mod anthropic;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::prompt::GenerateOptions;
use crate::request::PlanRequest;

pub use anthropic::AnthropicEndpoint;
pub use http::HttpEndpoint;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which generation branch a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Features,
    Research,
}

impl PromptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Research => "research",
        }
    }
}

/// Everything an endpoint may need for one call.
#[derive(Debug, Clone, Copy)]
pub struct EndpointCall<'a> {
    pub kind: PromptKind,
    pub prompt: &'a str,
    pub system: &'a str,
    pub request: &'a PlanRequest,
    pub options: &'a GenerateOptions,
}

/// Token usage reported by the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(alias = "inputTokens", alias = "prompt_tokens")]
    pub input_tokens: u64,
    #[serde(alias = "outputTokens", alias = "completion_tokens")]
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReply {
    pub text: String,
    /// Model that produced the text, when the endpoint says.
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("endpoint reported failure: {0}")]
    Unsuccessful(String),

    #[error("failed to parse endpoint response: {0}")]
    Parse(String),

    #[error("endpoint returned no content")]
    EmptyResponse,

    #[error("no API key configured")]
    MissingApiKey,
}

impl EndpointError {
    /// Classify a transport error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err)
        }
    }
}

/// A remote service that turns a prompt into text.
///
/// Object-safe so the orchestrator can hold `Arc<dyn GenerationEndpoint>`.
#[async_trait]
pub trait GenerationEndpoint: Send + Sync {
    /// Short name used in logs and plan provenance (e.g. "edge-function").
    fn name(&self) -> &str;

    async fn generate(&self, call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError>;
}

// Compile-time assertion: GenerationEndpoint must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn GenerationEndpoint) {}
};

/// Keep at most `max` characters of an error body for logs.
pub(crate) fn truncate_body(body: &str, max: usize) -> String {
    if body.chars().count() <= max {
        body.to_string()
    } else {
        let mut cut: String = body.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl GenerationEndpoint for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError> {
            Ok(EndpointReply {
                text: format!("{}:{}", call.kind.as_str(), call.prompt),
                model: None,
                usage: None,
            })
        }
    }

    #[test]
    fn usage_total_saturates() {
        let usage: Usage =
            serde_json::from_str(r#"{"input_tokens":18446744073709551615,"output_tokens":5}"#)
                .unwrap();
        assert_eq!(usage.total(), u64::MAX);

        let usage: Usage =
            serde_json::from_str(r#"{"inputTokens":120,"completion_tokens":30}"#).unwrap();
        assert_eq!(usage.total(), 150);
    }

    #[tokio::test]
    async fn endpoint_usable_as_trait_object() {
        let endpoint: Box<dyn GenerationEndpoint> = Box::new(Echo);
        let request = PlanRequest {
            business_name: "Acme".to_string(),
            app_purpose: "booking".to_string(),
            industry: "Restaurant".to_string(),
            target_audience: "diners".to_string(),
            budget: None,
            timeline: None,
            communication_preference: None,
        };
        let options = GenerateOptions::default();
        let reply = endpoint
            .generate(&EndpointCall {
                kind: PromptKind::Research,
                prompt: "hi",
                system: "",
                request: &request,
                options: &options,
            })
            .await
            .unwrap();
        assert_eq!(reply.text, "research:hi");
        assert_eq!(endpoint.name(), "echo");
    }

    #[test]
    fn usage_accepts_camel_case() {
        let usage: Usage = serde_json::from_str(r#"{"inputTokens": 10, "outputTokens": 5}"#).unwrap();
        assert_eq!(usage.total(), 15);
    }

    #[test]
    fn truncates_long_bodies() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("abcdefghij", 4), "abcd...");
    }
}
