//! The plan-generation edge function contract.
//!
//! Request: `POST {businessData, options}` where `options` carries the
//! generation flags plus the branch (`section`) and the prompt text.
//! Response: `{success, rawResponse | content, generatedPlan?, model?,
//! usage?, error?}`. Only presence is checked; the structurer owns
//! validation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::prompt::DetailLevel;
use crate::request::PlanRequest;

use super::{
    EndpointCall, EndpointError, EndpointReply, GenerationEndpoint, PromptKind, Usage,
    truncate_body,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRequest<'a> {
    business_data: &'a PlanRequest,
    options: EdgeOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeOptions<'a> {
    detail_level: DetailLevel,
    focus_areas: &'a [String],
    include_research: bool,
    section: PromptKind,
    prompt: &'a str,
    system_prompt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeResponse {
    #[serde(default)]
    success: bool,
    raw_response: Option<String>,
    content: Option<String>,
    generated_plan: Option<serde_json::Value>,
    model: Option<String>,
    usage: Option<Usage>,
    error: Option<String>,
}

/// Client for an HTTP endpoint speaking the edge-function contract.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpEndpoint {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl GenerationEndpoint for HttpEndpoint {
    fn name(&self) -> &str {
        "edge-function"
    }

    async fn generate(&self, call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError> {
        let body = EdgeRequest {
            business_data: call.request,
            options: EdgeOptions {
                detail_level: call.options.detail_level,
                focus_areas: &call.options.focus_areas,
                include_research: call.options.include_research,
                section: call.kind,
                prompt: call.prompt,
                system_prompt: call.system,
            },
        };

        debug!(url = %self.url, section = call.kind.as_str(), "calling generation endpoint");

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key).header("apikey", key);
        }
        let response = req.send().await.map_err(EndpointError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "generation endpoint returned an error status");
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body: truncate_body(&text, 500),
            });
        }

        let parsed: EdgeResponse = response
            .json()
            .await
            .map_err(|e| EndpointError::Parse(e.to_string()))?;

        if !parsed.success {
            return Err(EndpointError::Unsuccessful(
                parsed
                    .error
                    .unwrap_or_else(|| "success flag not set".to_string()),
            ));
        }

        let plan_text = match (call.kind, parsed.generated_plan) {
            (PromptKind::Features, Some(plan)) if !plan.is_null() => Some(plan.to_string()),
            _ => None,
        };
        let text = plan_text
            .or_else(|| non_blank(parsed.raw_response))
            .or_else(|| non_blank(parsed.content))
            .ok_or(EndpointError::EmptyResponse)?;

        Ok(EndpointReply {
            text,
            model: parsed.model,
            usage: parsed.usage,
        })
    }
}
