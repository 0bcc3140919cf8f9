//! The plan payload schema: the JSON shape the features prompt asks for.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::plan::{
    Complexity, CostModel, Feature, PlanDraft, Priority, ResearchResults, StructureSource,
    TechnicalRequirements, UiUxPlan, derive_phases, rank_features,
};

pub const MAX_FEATURES: usize = 50;

/// Upper bound on a single feature's `estimatedHours`.
pub const MAX_FEATURE_HOURS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub user_stories: Vec<String>,
}

/// Structured plan content as produced by the endpoint (or a template).
///
/// Unknown keys, including any model-supplied cost figures, are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    pub features: Vec<FeaturePayload>,
    #[serde(default)]
    pub technical_requirements: TechnicalRequirements,
    #[serde(default)]
    pub uiux_plan: UiUxPlan,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("payload is not valid JSON for the plan schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no features")]
    NoFeatures,

    #[error("payload has {count} features (max {MAX_FEATURES})")]
    TooManyFeatures { count: usize },

    #[error("feature {index} has a blank name")]
    BlankName { index: usize },

    #[error("feature {index} ({name:?}) has a blank description")]
    BlankDescription { index: usize, name: String },

    #[error("duplicate feature name {0:?}")]
    DuplicateName(String),

    #[error("feature {name:?} estimates {hours} hours (max {MAX_FEATURE_HOURS})")]
    HoursOutOfRange { name: String, hours: u32 },
}

/// Locate a JSON object in `text`: either the whole trimmed text, or the
/// body of the first markdown code fence.
///
/// Returns `None` when the text does not look like JSON at all.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }

    let start = trimmed.find("```")?;
    let after_fence = &trimmed[start + 3..];
    // Skip the info string (`json`, `JSON`, nothing).
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let body = body.trim();
    body.starts_with('{').then_some(body)
}

/// Deserialize and validate a plan payload.
pub fn parse_payload(json: &str) -> Result<PlanPayload, SchemaError> {
    let payload: PlanPayload = serde_json::from_str(json)?;
    payload.validate()?;
    Ok(payload)
}

impl PlanPayload {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.features.is_empty() {
            return Err(SchemaError::NoFeatures);
        }
        if self.features.len() > MAX_FEATURES {
            return Err(SchemaError::TooManyFeatures {
                count: self.features.len(),
            });
        }

        let mut seen = HashSet::new();
        for (index, feature) in self.features.iter().enumerate() {
            let name = feature.name.trim();
            if name.is_empty() {
                return Err(SchemaError::BlankName { index });
            }
            if feature.description.trim().is_empty() {
                return Err(SchemaError::BlankDescription {
                    index,
                    name: name.to_string(),
                });
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(SchemaError::DuplicateName(name.to_string()));
            }
            // Zero means "not given" and is replaced by the complexity default.
            if let Some(hours) = feature.estimated_hours.filter(|h| *h > MAX_FEATURE_HOURS) {
                return Err(SchemaError::HoursOutOfRange {
                    name: name.to_string(),
                    hours,
                });
            }
        }
        Ok(())
    }

    /// Turn a validated payload into a draft. Ids and priorities come from
    /// list position; costs are computed with `cost_model`.
    pub fn into_draft(self, source: StructureSource, cost_model: &CostModel) -> PlanDraft {
        let mut features: Vec<Feature> = self
            .features
            .into_iter()
            .map(|f| Feature {
                id: String::new(),
                name: f.name.trim().to_string(),
                description: f.description.trim().to_string(),
                priority: Priority::Low,
                complexity: f.complexity,
                estimated_hours: f
                    .estimated_hours
                    .filter(|h| *h > 0)
                    .unwrap_or_else(|| f.complexity.base_hours()),
                dependencies: f.dependencies,
                user_stories: f.user_stories,
            })
            .collect();
        rank_features(&mut features);

        PlanDraft {
            development_phases: derive_phases(&features),
            cost_breakdown: cost_model.estimate(&features),
            features,
            technical_requirements: self.technical_requirements,
            uiux_plan: self.uiux_plan,
            research_results: ResearchResults::default(),
            source,
        }
    }
}
