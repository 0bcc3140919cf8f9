//! The plan document: typed features, phases, costs and research.
//!
//! A [`PlanDraft`] is what the structurer produces from raw text. Stamping it
//! with identity gives a [`GeneratedPlan`], which is never edited in place:
//! refinement clones it into a new version that points back at its parent.

pub mod cost;
pub mod phases;
pub mod types;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use blueprint_db::models::PlanStatus;
pub use cost::{CostBreakdown, CostModel};
pub use phases::derive_phases;
pub use types::{
    Complexity, Feature, Phase, Priority, ResearchResults, ResearchSection, TechnicalRequirements,
    UiUxPlan,
};

use crate::request::PlanRequest;

/// Which structuring path produced a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureSource {
    /// Text parsed and validated against the plan payload schema.
    Schema,
    /// Sections pulled out of free text.
    Heuristic,
    /// Industry template substituted for unusable text.
    Template,
}

/// A structured plan without identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    pub features: Vec<Feature>,
    pub technical_requirements: TechnicalRequirements,
    pub development_phases: Vec<Phase>,
    pub cost_breakdown: CostBreakdown,
    pub uiux_plan: UiUxPlan,
    pub research_results: ResearchResults,
    pub source: StructureSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub id: Uuid,
    pub business_name: String,
    pub app_name: String,
    pub description: String,
    pub industry: String,
    pub generated_at: DateTime<Utc>,
    pub model_used: String,
    pub features: Vec<Feature>,
    pub technical_requirements: TechnicalRequirements,
    pub development_phases: Vec<Phase>,
    pub cost_breakdown: CostBreakdown,
    pub uiux_plan: UiUxPlan,
    pub research_results: ResearchResults,
    pub status: PlanStatus,
    pub version: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

/// Feature edits applied by [`GeneratedPlan::refine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRefinement {
    /// Names of features to append.
    pub add_features: Vec<String>,
    /// Names of features to drop, matched case-insensitively.
    pub remove_features: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RefineError {
    #[error("no feature named {0:?} in this plan")]
    UnknownFeature(String),

    #[error("feature {0:?} already exists in this plan")]
    DuplicateFeature(String),

    #[error("feature name must not be blank")]
    BlankFeature,

    #[error("refinement would leave the plan without features")]
    NoFeaturesLeft,
}

/// Reassign positional ids and priorities.
pub fn rank_features(features: &mut [Feature]) {
    for (i, feature) in features.iter_mut().enumerate() {
        feature.id = format!("feature-{}", i + 1);
        feature.priority = Priority::for_position(i);
    }
}

impl GeneratedPlan {
    /// Stamp a draft with identity: fresh id, `draft` status, version 1.
    pub fn from_draft(draft: PlanDraft, request: &PlanRequest, model_used: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_name: request.business_name.clone(),
            app_name: app_name_for(&request.business_name),
            description: format!(
                "A {} app for {}, built for {}.",
                request.app_purpose, request.business_name, request.target_audience
            ),
            industry: request.industry.clone(),
            generated_at: Utc::now(),
            model_used: model_used.to_string(),
            features: draft.features,
            technical_requirements: draft.technical_requirements,
            development_phases: draft.development_phases,
            cost_breakdown: draft.cost_breakdown,
            uiux_plan: draft.uiux_plan,
            research_results: draft.research_results,
            status: PlanStatus::Draft,
            version: 1,
            parent_id: None,
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }

    /// Clone into the next version with features added and removed.
    ///
    /// Priorities are re-ranked by position; phases and costs are
    /// recomputed with `cost_model`.
    pub fn refine(
        &self,
        refinement: &PlanRefinement,
        cost_model: &CostModel,
    ) -> Result<GeneratedPlan, RefineError> {
        let mut features = self.features.clone();

        for name in &refinement.remove_features {
            let before = features.len();
            features.retain(|f| !same_name(&f.name, name));
            if features.len() == before {
                return Err(RefineError::UnknownFeature(name.clone()));
            }
        }

        for name in &refinement.add_features {
            let name = name.trim();
            if name.is_empty() {
                return Err(RefineError::BlankFeature);
            }
            if features.iter().any(|f| same_name(&f.name, name)) {
                return Err(RefineError::DuplicateFeature(name.to_string()));
            }
            let complexity = Complexity::Moderate;
            features.push(Feature {
                id: String::new(),
                name: name.to_string(),
                description: format!("{name} for {}", self.business_name),
                priority: Priority::Low,
                complexity,
                estimated_hours: complexity.base_hours(),
                dependencies: vec![],
                user_stories: vec![],
            });
        }

        if features.is_empty() {
            return Err(RefineError::NoFeaturesLeft);
        }

        let names: Vec<String> = features.iter().map(|f| f.name.clone()).collect();
        for feature in &mut features {
            feature.dependencies.retain(|d| names.contains(d));
        }
        rank_features(&mut features);

        let mut next = self.clone();
        next.id = Uuid::new_v4();
        next.generated_at = Utc::now();
        next.development_phases = derive_phases(&features);
        next.cost_breakdown = cost_model.estimate(&features);
        next.features = features;
        next.status = PlanStatus::Draft;
        next.version = self.version + 1;
        next.parent_id = Some(self.id);
        Ok(next)
    }

    pub fn approve(&mut self) {
        self.status = PlanStatus::Approved;
    }

    /// Reduced copy used when persisting the full plan fails: feature names
    /// kept, descriptions and user stories dropped, research emptied.
    pub fn simplified(&self) -> GeneratedPlan {
        let mut plan = self.clone();
        for feature in &mut plan.features {
            feature.description.clear();
            feature.user_stories.clear();
            feature.dependencies.clear();
        }
        plan.research_results = ResearchResults::default();
        plan
    }
}

pub fn app_name_for(business_name: &str) -> String {
    format!("{business_name} App")
}

/// Feature names compare trimmed and case-insensitively, Unicode-aware.
fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            business_name: "Acme".to_string(),
            app_purpose: "table booking".to_string(),
            industry: "Restaurant".to_string(),
            target_audience: "diners".to_string(),
            budget: None,
            timeline: None,
            communication_preference: None,
        }
    }

    fn draft(names: &[&str]) -> PlanDraft {
        let mut features: Vec<Feature> = names
            .iter()
            .map(|name| Feature {
                id: String::new(),
                name: name.to_string(),
                description: format!("{name} description"),
                priority: Priority::Low,
                complexity: Complexity::Moderate,
                estimated_hours: 40,
                dependencies: vec![],
                user_stories: vec![format!("As a user I use {name}")],
            })
            .collect();
        rank_features(&mut features);
        PlanDraft {
            development_phases: derive_phases(&features),
            cost_breakdown: CostModel::default().estimate(&features),
            features,
            technical_requirements: TechnicalRequirements::default(),
            uiux_plan: UiUxPlan::default(),
            research_results: ResearchResults {
                market_trends: vec![ResearchSection {
                    title: "Trends".to_string(),
                    body: "Delivery apps dominate".to_string(),
                }],
                ..Default::default()
            },
            source: StructureSource::Schema,
        }
    }

    #[test]
    fn from_draft_stamps_identity() {
        let plan = GeneratedPlan::from_draft(draft(&["A", "B"]), &request(), "fallback");
        assert_eq!(plan.app_name, "Acme App");
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.version, 1);
        assert!(plan.parent_id.is_none());
        assert_eq!(plan.feature_names(), vec!["A", "B"]);
    }

    #[test]
    fn refine_creates_child_version() {
        let mut plan = GeneratedPlan::from_draft(draft(&["A", "B", "C", "D"]), &request(), "m");
        plan.approve();
        let refined = plan
            .refine(
                &PlanRefinement {
                    add_features: vec!["Gift Cards".to_string()],
                    remove_features: vec!["a".to_string()],
                },
                &CostModel::default(),
            )
            .unwrap();

        assert_ne!(refined.id, plan.id);
        assert_eq!(refined.parent_id, Some(plan.id));
        assert_eq!(refined.version, 2);
        assert_eq!(refined.status, PlanStatus::Draft);
        assert_eq!(refined.feature_names(), vec!["B", "C", "D", "Gift Cards"]);
        assert_eq!(refined.features[0].id, "feature-1");
        assert_eq!(refined.features[0].priority, Priority::High);
        assert_eq!(refined.features[3].priority, Priority::Medium);
        assert_eq!(refined.cost_breakdown.development(), 4 * 40 * 75);
        assert!(refined.cost_breakdown.is_balanced());
        // The parent is untouched.
        assert_eq!(plan.features.len(), 4);
        assert_eq!(plan.status, PlanStatus::Approved);
    }

    #[test]
    fn refine_rejects_bad_edits() {
        let plan = GeneratedPlan::from_draft(draft(&["A"]), &request(), "m");
        let model = CostModel::default();

        let unknown = PlanRefinement {
            remove_features: vec!["Z".to_string()],
            ..Default::default()
        };
        assert_eq!(
            plan.refine(&unknown, &model),
            Err(RefineError::UnknownFeature("Z".to_string()))
        );

        let dup = PlanRefinement {
            add_features: vec!["a".to_string()],
            ..Default::default()
        };
        assert_eq!(
            plan.refine(&dup, &model),
            Err(RefineError::DuplicateFeature("a".to_string()))
        );

        let empty = PlanRefinement {
            remove_features: vec!["A".to_string()],
            ..Default::default()
        };
        assert_eq!(plan.refine(&empty, &model), Err(RefineError::NoFeaturesLeft));
    }

    #[test]
    fn refine_matches_non_ascii_names_consistently() {
        let plan = GeneratedPlan::from_draft(draft(&["Café Menu", "Ökonomie"]), &request(), "m");
        let model = CostModel::default();

        let dup = PlanRefinement {
            add_features: vec!["CAFÉ MENU".to_string()],
            ..Default::default()
        };
        assert_eq!(
            plan.refine(&dup, &model),
            Err(RefineError::DuplicateFeature("CAFÉ MENU".to_string()))
        );

        let swap = PlanRefinement {
            remove_features: vec!["ökonomie".to_string()],
            add_features: vec!["ÖKONOMIE".to_string()],
        };
        let refined = plan.refine(&swap, &model).unwrap();
        assert_eq!(refined.feature_names(), vec!["Café Menu", "ÖKONOMIE"]);
    }

    #[test]
    fn simplified_keeps_names_only() {
        let plan = GeneratedPlan::from_draft(draft(&["A", "B"]), &request(), "m");
        let simple = plan.simplified();
        assert_eq!(simple.id, plan.id);
        assert_eq!(simple.feature_names(), plan.feature_names());
        assert!(simple.features.iter().all(|f| f.description.is_empty()));
        assert!(simple.features.iter().all(|f| f.user_stories.is_empty()));
        assert!(simple.research_results.is_empty());
    }

    #[test]
    fn plan_json_round_trip() {
        let plan = GeneratedPlan::from_draft(draft(&["A"]), &request(), "m");
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["status"], "draft");
        assert_eq!(json["businessName"], "Acme");
        assert!(json.get("parentId").is_none());
        let back: GeneratedPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
