//! Industry plan templates and the deterministic fallback text built from
//! them.
//!
//! The templates are defined in `industries.toml` and embedded in the binary
//! at compile time.

pub mod fallback;

use std::sync::LazyLock;

use serde::Deserialize;

use crate::plan::{Complexity, TechnicalRequirements, UiUxPlan};
use crate::request::PlanRequest;
use crate::structurer::schema::{FeaturePayload, PlanPayload};

pub use fallback::{fallback_features_text, fallback_research_text};

/// One feature of a template. Descriptions may use `{business}` and
/// `{audience}` placeholders.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateFeature {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub user_stories: Vec<String>,
}

/// A canned plan skeleton for one industry.
#[derive(Debug, Clone, Deserialize)]
pub struct IndustryTemplate {
    pub name: String,
    /// Lowercase industry names that select this template.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub design_style: String,
    pub key_screens: Vec<String>,
    pub platforms: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    pub features: Vec<TemplateFeature>,
}

#[derive(Debug, Deserialize)]
struct TemplateLibrary {
    default: IndustryTemplate,
    industries: Vec<IndustryTemplate>,
}

static TEMPLATES_TOML: &str = include_str!("industries.toml");

// The TOML ships inside the binary; if it built, it parses.
static LIBRARY: LazyLock<TemplateLibrary> = LazyLock::new(|| {
    toml::from_str(TEMPLATES_TOML).expect("embedded industries.toml is invalid")
});

/// The generic template used for unrecognized industries.
pub fn default_template() -> &'static IndustryTemplate {
    &LIBRARY.default
}

/// Names of every industry with a dedicated template.
pub fn available_industries() -> Vec<&'static str> {
    LIBRARY.industries.iter().map(|t| t.name.as_str()).collect()
}

/// Look up the template for `industry`, if one is defined.
///
/// An exact alias match wins; otherwise the first template with an alias
/// appearing as whole words inside the industry name (so "Fast Food
/// Restaurant" selects the restaurant template).
pub fn find_template(industry: &str) -> Option<&'static IndustryTemplate> {
    let normalized = industry
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let exact = LIBRARY
        .industries
        .iter()
        .find(|t| t.aliases.iter().any(|a| *a == normalized));
    if exact.is_some() {
        return exact;
    }

    let padded = format!(" {normalized} ");
    LIBRARY
        .industries
        .iter()
        .find(|t| t.aliases.iter().any(|a| padded.contains(&format!(" {a} "))))
}

/// The template for `industry`, or the generic default.
pub fn template_for(industry: &str) -> &'static IndustryTemplate {
    find_template(industry).unwrap_or_else(default_template)
}

fn fill(text: &str, request: &PlanRequest) -> String {
    text.replace("{business}", &request.business_name)
        .replace("{audience}", &request.target_audience)
}

impl IndustryTemplate {
    /// Render this template as a plan payload personalised for `request`.
    pub fn payload(&self, request: &PlanRequest) -> PlanPayload {
        let features = self
            .features
            .iter()
            .map(|f| FeaturePayload {
                name: f.name.clone(),
                description: fill(&f.description, request),
                complexity: f.complexity,
                estimated_hours: Some(f.complexity.base_hours()),
                dependencies: Vec::new(),
                user_stories: f.user_stories.iter().map(|s| fill(s, request)).collect(),
            })
            .collect();

        PlanPayload {
            features,
            technical_requirements: TechnicalRequirements {
                platforms: self.platforms.clone(),
                frontend: vec!["React".to_string(), "TypeScript".to_string()],
                backend: vec!["REST API".to_string(), "Authentication service".to_string()],
                database: vec!["PostgreSQL".to_string()],
                integrations: self.integrations.clone(),
                hosting: vec!["Managed cloud hosting".to_string()],
            },
            uiux_plan: UiUxPlan {
                design_style: self.design_style.clone(),
                key_screens: self.key_screens.clone(),
                accessibility: vec![
                    "WCAG 2.1 AA contrast".to_string(),
                    "Screen reader labels".to_string(),
                    "Keyboard navigation".to_string(),
                ],
            },
        }
    }
}
