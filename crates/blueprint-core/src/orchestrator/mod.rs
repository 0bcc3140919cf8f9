//! Prompt/response orchestrator: turns a [`PlanRequest`] into raw text.
//!
//! Each branch ("features", and "research" when requested) either calls the
//! remote endpoint or substitutes deterministic local text. The branches run
//! concurrently and fall back independently. Endpoint failures never reach
//! the caller; only malformed options do.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::future;
use tracing::{debug, info, warn};

use crate::budget::{BudgetDecision, TokenBudget, UsageLedger, estimate_tokens};
use crate::endpoint::{EndpointCall, GenerationEndpoint, PromptKind};
use crate::prompt::{
    GenerateOptions, OptionsError, SYSTEM_PROMPT, build_features_prompt, build_research_prompt,
};
use crate::request::PlanRequest;
use crate::templates::{fallback_features_text, fallback_research_text};

/// Model label recorded for plans built from local fallback text.
pub const FALLBACK_MODEL: &str = "local-template";

/// Why a branch used local text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    BudgetExhausted { used: u64, limit: u64 },
    EndpointFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExhausted { used, limit } => {
                write!(f, "daily token budget exhausted ({used}/{limit})")
            }
            Self::EndpointFailed(msg) => write!(f, "endpoint failed: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Remote {
        endpoint: String,
        model: Option<String>,
    },
    Fallback {
        reason: FallbackReason,
    },
}

/// Text produced by one branch, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    pub text: String,
    pub source: TextSource,
}

impl RawText {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, TextSource::Fallback { .. })
    }

    /// The model name to record for this text.
    pub fn model_label(&self) -> String {
        match &self.source {
            TextSource::Remote { endpoint, model } => {
                model.clone().unwrap_or_else(|| endpoint.clone())
            }
            TextSource::Fallback { .. } => FALLBACK_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGeneration {
    pub features: RawText,
    /// Present when research was requested.
    pub research: Option<RawText>,
}

impl RawGeneration {
    pub fn model_used(&self) -> String {
        self.features.model_label()
    }
}

pub struct Orchestrator {
    endpoint: Arc<dyn GenerationEndpoint>,
    ledger: Arc<dyn UsageLedger>,
    budget: TokenBudget,
}

impl Orchestrator {
    pub fn new(
        endpoint: Arc<dyn GenerationEndpoint>,
        ledger: Arc<dyn UsageLedger>,
        budget: TokenBudget,
    ) -> Self {
        Self {
            endpoint,
            ledger,
            budget,
        }
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    /// Produce raw features (and optionally research) text for `request`.
    pub async fn generate(
        &self,
        request: &PlanRequest,
        options: &GenerateOptions,
    ) -> Result<RawGeneration, OptionsError> {
        options.validate()?;

        let features_prompt = build_features_prompt(request, options);
        if !options.include_research {
            let features = self
                .run_branch(PromptKind::Features, &features_prompt, request, options)
                .await;
            return Ok(RawGeneration {
                features,
                research: None,
            });
        }

        let research_prompt = build_research_prompt(request, options);
        let (features, research) = future::join(
            self.run_branch(PromptKind::Features, &features_prompt, request, options),
            self.run_branch(PromptKind::Research, &research_prompt, request, options),
        )
        .await;

        Ok(RawGeneration {
            features,
            research: Some(research),
        })
    }

    async fn run_branch(
        &self,
        kind: PromptKind,
        prompt: &str,
        request: &PlanRequest,
        options: &GenerateOptions,
    ) -> RawText {
        let today = Utc::now().date_naive();
        let estimate = estimate_tokens(SYSTEM_PROMPT) + estimate_tokens(prompt);

        match self.ledger.used_on(today).await {
            Ok(used) => {
                if let BudgetDecision::Exhausted { used, limit } =
                    self.budget.evaluate(used, estimate)
                {
                    info!(section = kind.as_str(), used, limit, "token budget exhausted; using local fallback");
                    return fallback(kind, request, FallbackReason::BudgetExhausted { used, limit });
                }
            }
            Err(e) => {
                warn!(section = kind.as_str(), error = %format!("{e:#}"), "could not read token usage; proceeding");
            }
        }

        let call = EndpointCall {
            kind,
            prompt,
            system: SYSTEM_PROMPT,
            request,
            options,
        };
        match self.endpoint.generate(&call).await {
            Ok(reply) => {
                let tokens = reply
                    .usage
                    .map(|u| u.total())
                    .unwrap_or_else(|| estimate + estimate_tokens(&reply.text));
                if let Err(e) = self.ledger.record(today, tokens).await {
                    warn!(section = kind.as_str(), error = %format!("{e:#}"), "could not record token usage");
                }
                debug!(
                    section = kind.as_str(),
                    endpoint = self.endpoint.name(),
                    tokens,
                    "remote generation succeeded"
                );
                RawText {
                    text: reply.text,
                    source: TextSource::Remote {
                        endpoint: self.endpoint.name().to_string(),
                        model: reply.model,
                    },
                }
            }
            Err(e) => {
                warn!(
                    section = kind.as_str(),
                    endpoint = self.endpoint.name(),
                    error = %e,
                    "remote generation failed; using local fallback"
                );
                fallback(kind, request, FallbackReason::EndpointFailed(e.to_string()))
            }
        }
    }
}

fn fallback(kind: PromptKind, request: &PlanRequest, reason: FallbackReason) -> RawText {
    let text = match kind {
        PromptKind::Features => fallback_features_text(request),
        PromptKind::Research => fallback_research_text(request),
    };
    RawText {
        text,
        source: TextSource::Fallback { reason },
    }
}
