//! Response structurer: raw generation text to a typed [`PlanDraft`].
//!
//! Paths, tried in order:
//!
//! 1. **Schema**: the text is (or contains a fenced) JSON plan payload that
//!    validates. Malformed or invalid JSON skips straight to the template.
//! 2. **Heuristic**: free text split into titled sections.
//! 3. **Template**: the industry template, when nothing usable came out.
//!
//! The structurer is stateless apart from its cost model; identical input
//! yields identical features.

pub mod schema;
pub mod sections;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::plan::{
    Complexity, CostModel, Feature, PlanDraft, Priority, ResearchResults, StructureSource,
    derive_phases, rank_features,
};
use crate::request::PlanRequest;
use crate::templates::template_for;

pub use schema::{PlanPayload, SchemaError, extract_json, parse_payload};
pub use sections::{ResearchBucket, Section, classify, split_sections};

#[derive(Debug, Clone, Default)]
pub struct Structurer {
    cost_model: CostModel,
}

impl Structurer {
    pub fn new(cost_model: CostModel) -> Self {
        Self { cost_model }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Structure the features text of a generation.
    ///
    /// Always returns at least one feature.
    pub fn structure(&self, raw_text: &str, request: &PlanRequest) -> PlanDraft {
        if let Some(json) = extract_json(raw_text) {
            return match parse_payload(json) {
                Ok(payload) => {
                    debug!(features = payload.features.len(), "structured via schema");
                    payload.into_draft(StructureSource::Schema, &self.cost_model)
                }
                Err(e) => {
                    warn!(error = %e, industry = %request.industry, "plan payload rejected; using industry template");
                    self.template_draft(request)
                }
            };
        }

        let mut research = ResearchResults::default();
        let mut features: Vec<Feature> = Vec::new();
        let mut seen = HashSet::new();

        for section in split_sections(raw_text) {
            if let Some(bucket) = classify(&section.title, &request.business_name) {
                sections::file_section(&mut research, bucket, section);
                continue;
            }
            if features.len() >= schema::MAX_FEATURES || !seen.insert(section.title.to_lowercase()) {
                continue;
            }
            let complexity = Complexity::Moderate;
            features.push(Feature {
                id: String::new(),
                name: section.title,
                description: section.body,
                priority: Priority::Low,
                complexity,
                estimated_hours: complexity.base_hours(),
                dependencies: Vec::new(),
                user_stories: Vec::new(),
            });
        }

        if features.is_empty() {
            debug!(industry = %request.industry, "no features in text; using industry template");
            let mut draft = self.template_draft(request);
            draft.research_results = research;
            return draft;
        }

        debug!(features = features.len(), "structured via section heuristics");
        rank_features(&mut features);
        // Free text carries no technical or UI detail; borrow the template's.
        let template = template_for(&request.industry).payload(request);
        PlanDraft {
            development_phases: derive_phases(&features),
            cost_breakdown: self.cost_model.estimate(&features),
            features,
            technical_requirements: template.technical_requirements,
            uiux_plan: template.uiux_plan,
            research_results: research,
            source: StructureSource::Heuristic,
        }
    }

    /// Extract only the research buckets from `raw_text`. Sections that do
    /// not map to a bucket are discarded.
    pub fn structure_research(&self, raw_text: &str, request: &PlanRequest) -> ResearchResults {
        if let Some(json) = extract_json(raw_text) {
            return match serde_json::from_str::<ResearchResults>(json) {
                Ok(research) => research,
                Err(e) => {
                    warn!(error = %e, "research payload rejected");
                    ResearchResults::default()
                }
            };
        }

        let mut research = ResearchResults::default();
        for section in split_sections(raw_text) {
            if let Some(bucket) = classify(&section.title, &request.business_name) {
                sections::file_section(&mut research, bucket, section);
            }
        }
        research
    }

    /// The industry template (or generic default) as a draft.
    pub fn template_draft(&self, request: &PlanRequest) -> PlanDraft {
        template_for(&request.industry)
            .payload(request)
            .into_draft(StructureSource::Template, &self.cost_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(industry: &str) -> PlanRequest {
        PlanRequest {
            business_name: "Acme".to_string(),
            app_purpose: "table booking".to_string(),
            industry: industry.to_string(),
            target_audience: "diners".to_string(),
            budget: None,
            timeline: None,
            communication_preference: None,
        }
    }

    fn names(draft: &PlanDraft) -> Vec<&str> {
        draft.features.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn empty_text_uses_industry_template() {
        let draft = Structurer::default().structure("", &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Template);
        let names = names(&draft);
        assert!(names.contains(&"Online Menu Management"));
        assert!(names.contains(&"Table Reservation System"));
    }

    #[test]
    fn unknown_industry_uses_generic_default() {
        let draft = Structurer::default().structure("   \n", &request("Unknown Sector"));
        assert_eq!(draft.features.len(), 5);
        assert_eq!(draft.features[0].name, "User Accounts & Authentication");
    }

    #[test]
    fn text_without_sections_uses_template() {
        let draft = Structurer::default().structure("ok", &request("Retail"));
        assert_eq!(draft.source, StructureSource::Template);
        assert_eq!(draft.features[0].name, "Product Catalog");
    }

    #[test]
    fn invalid_json_skips_heuristics() {
        let text = "{\"features\": [{\"name\": \"Menu\"}]}\n\nLoyalty Program\nPoints for repeat visits";
        let draft = Structurer::default().structure(text, &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Template);
        assert_eq!(draft.features.len(), 6);
        assert_eq!(draft.features[0].name, "Online Menu Management");
    }

    #[test]
    fn oversized_hours_use_template() {
        let text = r#"{"features":[{"name":"A","description":"aaa","estimatedHours":4294967295},{"name":"B","description":"bbb","estimatedHours":10}]}"#;
        let draft = Structurer::default().structure(text, &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Template);
        assert_eq!(draft.features[0].name, "Online Menu Management");
        assert!(draft.cost_breakdown.is_balanced());
    }

    #[test]
    fn valid_json_wins() {
        let text = "```json\n{\"features\": [{\"name\": \"Gift Cards\", \"description\": \"Sell gift cards\"}]}\n```";
        let draft = Structurer::default().structure(text, &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Schema);
        assert_eq!(names(&draft), vec!["Gift Cards"]);
    }

    #[test]
    fn free_text_sections_become_features_and_research() {
        let text = "\
## Online Menu
Diners browse dishes and prices

## Table Booking
Reserve a table in a few taps

## Market Trends
Delivery keeps growing every year

## Online Menu
A duplicate section that is ignored";
        let draft = Structurer::default().structure(text, &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Heuristic);
        assert_eq!(names(&draft), vec!["Online Menu", "Table Booking"]);
        assert_eq!(draft.research_results.market_trends.len(), 1);
        assert_eq!(draft.features[1].priority, Priority::High);
        assert!(!draft.technical_requirements.platforms.is_empty());
    }

    #[test]
    fn research_only_text_falls_back_but_keeps_research() {
        let text = "Industry Analysis\nRestaurants run on thin margins";
        let draft = Structurer::default().structure(text, &request("Restaurant"));
        assert_eq!(draft.source, StructureSource::Template);
        assert_eq!(draft.research_results.industry_analysis.len(), 1);
    }

    #[test]
    fn structuring_is_deterministic() {
        let text = "Online Menu\nDiners browse dishes\n\nReviews\nCollect feedback after visits";
        let s = Structurer::default();
        let a = s.structure(text, &request("Restaurant"));
        let b = s.structure(text, &request("Restaurant"));
        assert_eq!(a, b);
    }

    #[test]
    fn research_extraction_discards_unknown_sections() {
        let text = "Company Profile: Acme\nA family bistro since 1990\n\n\
                    Opening Hours\nNoon to midnight every day\n\n\
                    Feature Recommendations\nStart with online booking";
        let research = Structurer::default().structure_research(text, &request("Restaurant"));
        assert_eq!(research.company_profile.len(), 1);
        assert_eq!(research.feature_recommendations.len(), 1);
        assert_eq!(research.section_count(), 2);
    }

    #[test]
    fn research_json_is_accepted() {
        let text = r#"{"marketTrends": [{"title": "Delivery", "body": "Keeps growing"}]}"#;
        let research = Structurer::default().structure_research(text, &request("Restaurant"));
        assert_eq!(research.market_trends.len(), 1);
    }
}
