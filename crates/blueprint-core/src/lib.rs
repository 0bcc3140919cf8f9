//! Application-plan generation pipeline.
//!
//! ```text
//! OnboardingSource(s) --assemble_request--> PlanRequest
//!     |
//!     v
//! Orchestrator --(features | research, joined)--> RawGeneration
//!     |            remote GenerationEndpoint, or local fallback text
//!     v
//! Structurer --schema | sections | industry template--> PlanDraft
//!     |
//!     v
//! GeneratedPlan --persist_with_fallback--> PlanStore (+ PlanCache mirror)
//! ```
//!
//! [`service::PlanService`] wires the pieces together.

pub mod budget;
pub mod cache;
pub mod endpoint;
pub mod orchestrator;
pub mod plan;
pub mod prompt;
pub mod request;
pub mod service;
pub mod store;
pub mod structurer;
pub mod templates;
