//! Building blocks of a plan document.
//!
//! Everything here serializes camelCase: the plan document stored in the
//! `plan` jsonb column and returned over HTTP uses the same shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Feature priority. Assigned purely by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// First three features are high, the next three medium, the rest low.
    pub fn for_position(index: usize) -> Self {
        match index {
            0..=2 => Self::High,
            3..=5 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// Rough implementation effort of a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    /// Default estimate in hours when none is supplied.
    pub fn base_hours(self) -> u32 {
        match self {
            Self::Simple => 16,
            Self::Moderate => 40,
            Self::Complex => 80,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Positional id (`feature-1`, `feature-2`, ...).
    pub id: String,
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub complexity: Complexity,
    pub estimated_hours: u32,
    /// Names of features this one builds on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub user_stories: Vec<String>,
}

/// A delivery phase. `features` holds ids of features in the same plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub features: Vec<String>,
    pub estimated_duration: String,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicalRequirements {
    pub platforms: Vec<String>,
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub database: Vec<String>,
    pub integrations: Vec<String>,
    pub hosting: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiUxPlan {
    pub design_style: String,
    pub key_screens: Vec<String>,
    pub accessibility: Vec<String>,
}

/// One titled block of research prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSection {
    pub title: String,
    pub body: String,
}

/// Research prose sorted into the four analysis buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResearchResults {
    pub company_profile: Vec<ResearchSection>,
    pub industry_analysis: Vec<ResearchSection>,
    pub feature_recommendations: Vec<ResearchSection>,
    pub market_trends: Vec<ResearchSection>,
}

impl ResearchResults {
    pub fn is_empty(&self) -> bool {
        self.company_profile.is_empty()
            && self.industry_analysis.is_empty()
            && self.feature_recommendations.is_empty()
            && self.market_trends.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.company_profile.len()
            + self.industry_analysis.len()
            + self.feature_recommendations.len()
            + self.market_trends.len()
    }

    /// Append every section of `other` to the matching bucket.
    pub fn merge(&mut self, other: ResearchResults) {
        self.company_profile.extend(other.company_profile);
        self.industry_analysis.extend(other.industry_analysis);
        self.feature_recommendations
            .extend(other.feature_recommendations);
        self.market_trends.extend(other.market_trends);
    }
}
