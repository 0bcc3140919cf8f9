//! Local stand-ins for remote generation output.
//!
//! Both texts are pure functions of the request, so a fallback plan is
//! reproducible. The features text is a plan payload in JSON and goes
//! through the same schema path as a well-behaved remote reply.

use crate::request::PlanRequest;

use super::template_for;

/// Features text for `request`: the industry template as JSON.
pub fn fallback_features_text(request: &PlanRequest) -> String {
    let payload = template_for(&request.industry).payload(request);
    // An empty string still structures to the same template.
    serde_json::to_string_pretty(&payload).unwrap_or_default()
}

/// Research text for `request`: four titled sections, blank-line separated.
pub fn fallback_research_text(request: &PlanRequest) -> String {
    let template = template_for(&request.industry);
    let highlights: Vec<&str> = template
        .features
        .iter()
        .take(3)
        .map(|f| f.name.as_str())
        .collect();

    let sections = [
        format!(
            "Company Profile: {name}\n{name} is a {industry} business building a {purpose} app for {audience}.",
            name = request.business_name,
            industry = request.industry,
            purpose = request.app_purpose,
            audience = request.target_audience,
        ),
        format!(
            "Industry Analysis\nBusinesses in the {} sector compete on convenience and service. \
             Digital tools that save {} time are becoming a baseline expectation.",
            request.industry, request.target_audience
        ),
        format!(
            "Feature Recommendations\nStart with {} to cover the core {} workflow, \
             then expand based on usage data.",
            highlights.join(", "),
            request.app_purpose
        ),
        format!(
            "Market Trends\nMobile-first experiences, self-service and personalised \
             communication continue to grow across the {} market.",
            request.industry
        ),
    ];
    sections.join("\n\n")
}
