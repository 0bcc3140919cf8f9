//! Generation options and prompt construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::request::PlanRequest;

pub const MAX_FOCUS_AREAS: usize = 10;
pub const MAX_FOCUS_AREA_LEN: usize = 80;

/// How much detail the generated plan should carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    #[default]
    Standard,
    Comprehensive,
}

impl DetailLevel {
    /// Suggested feature count range for the prompt.
    fn feature_range(self) -> (usize, usize) {
        match self {
            Self::Brief => (3, 5),
            Self::Standard => (5, 8),
            Self::Comprehensive => (8, 12),
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brief => "brief",
            Self::Standard => "standard",
            Self::Comprehensive => "comprehensive",
        })
    }
}

impl FromStr for DetailLevel {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Ok(Self::Brief),
            "standard" => Ok(Self::Standard),
            "comprehensive" => Ok(Self::Comprehensive),
            _ => Err(OptionsError::UnknownDetailLevel(s.to_string())),
        }
    }
}

/// Caller-supplied knobs for one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    pub detail_level: DetailLevel,
    pub focus_areas: Vec<String>,
    pub include_research: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Standard,
            focus_areas: Vec::new(),
            include_research: true,
        }
    }
}

/// Malformed generation options. The only error generation surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("too many focus areas: {count} (max {MAX_FOCUS_AREAS})")]
    TooManyFocusAreas { count: usize },

    #[error("focus area {index} is blank")]
    EmptyFocusArea { index: usize },

    #[error("focus area {index} is {len} characters (max {MAX_FOCUS_AREA_LEN})")]
    FocusAreaTooLong { index: usize, len: usize },

    #[error("unknown detail level {0:?} (expected brief, standard or comprehensive)")]
    UnknownDetailLevel(String),
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.focus_areas.len() > MAX_FOCUS_AREAS {
            return Err(OptionsError::TooManyFocusAreas {
                count: self.focus_areas.len(),
            });
        }
        for (index, area) in self.focus_areas.iter().enumerate() {
            let len = area.trim().chars().count();
            if len == 0 {
                return Err(OptionsError::EmptyFocusArea { index });
            }
            if len > MAX_FOCUS_AREA_LEN {
                return Err(OptionsError::FocusAreaTooLong { index, len });
            }
        }
        Ok(())
    }
}

/// System prompt shared by both generation branches.
pub const SYSTEM_PROMPT: &str = "You are a senior product strategist and software architect. \
     You turn a short business profile into a concrete, buildable application plan. \
     Be specific to the business and its industry; avoid generic filler.";

const PAYLOAD_SCHEMA: &str = r#"## Output Format

Respond with a single JSON object and nothing else:

```json
{
  "features": [
    {
      "name": "Feature name",
      "description": "What it does and who it serves",
      "complexity": "simple | moderate | complex",
      "estimatedHours": 40,
      "dependencies": ["Name of another feature"],
      "userStories": ["As a <role>, I want <goal> so that <benefit>"]
    }
  ],
  "technicalRequirements": {
    "platforms": [], "frontend": [], "backend": [],
    "database": [], "integrations": [], "hosting": []
  },
  "uiuxPlan": {
    "designStyle": "Short description",
    "keyScreens": [],
    "accessibility": []
  }
}
```

List features from most to least important. Feature names must be unique.
"#;

const RESEARCH_FORMAT: &str = r#"## Output Format

Write plain text sections separated by a blank line. Each section starts with
a title line, followed by one or more lines of body text. Use these titles:

Company Profile: <business name>
Industry Analysis
Feature Recommendations
Market Trends
"#;

fn push_business_profile(prompt: &mut String, request: &PlanRequest) {
    prompt.push_str("## Business Profile\n\n");
    prompt.push_str(&format!("- **Business name:** {}\n", request.business_name));
    prompt.push_str(&format!("- **App purpose:** {}\n", request.app_purpose));
    prompt.push_str(&format!("- **Industry:** {}\n", request.industry));
    prompt.push_str(&format!("- **Target audience:** {}\n", request.target_audience));
    if let Some(budget) = &request.budget {
        prompt.push_str(&format!("- **Budget:** {budget}\n"));
    }
    if let Some(timeline) = &request.timeline {
        prompt.push_str(&format!("- **Timeline:** {timeline}\n"));
    }
    if let Some(pref) = &request.communication_preference {
        prompt.push_str(&format!("- **Communication preference:** {pref}\n"));
    }
    prompt.push('\n');
}

fn push_focus_areas(prompt: &mut String, options: &GenerateOptions) {
    if options.focus_areas.is_empty() {
        return;
    }
    prompt.push_str("## Focus Areas\n\n");
    for area in &options.focus_areas {
        prompt.push_str(&format!("- {}\n", area.trim()));
    }
    prompt.push('\n');
}

/// Prompt for the features branch. Asks for JSON in the plan payload shape.
pub fn build_features_prompt(request: &PlanRequest, options: &GenerateOptions) -> String {
    let mut prompt = String::with_capacity(2048);
    let (min, max) = options.detail_level.feature_range();

    prompt.push_str("# Application Plan\n\n");
    prompt.push_str(&format!(
        "Design a {} app for {} in the {} industry. \
         Propose between {min} and {max} features.\n\n",
        request.app_purpose, request.business_name, request.industry
    ));
    push_business_profile(&mut prompt, request);
    push_focus_areas(&mut prompt, options);
    prompt.push_str(&format!(
        "- **Detail level:** {}\n- **Include research:** {}\n\n",
        options.detail_level, options.include_research
    ));
    prompt.push_str(PAYLOAD_SCHEMA);
    prompt
}

/// Prompt for the research branch. Asks for titled, blank-line separated
/// sections.
pub fn build_research_prompt(request: &PlanRequest, options: &GenerateOptions) -> String {
    let mut prompt = String::with_capacity(1536);

    prompt.push_str("# Market Research\n\n");
    prompt.push_str(&format!(
        "Research {} and the {} industry to inform a {} app aimed at {}.\n\n",
        request.business_name, request.industry, request.app_purpose, request.target_audience
    ));
    push_business_profile(&mut prompt, request);
    push_focus_areas(&mut prompt, options);
    prompt.push_str(&format!("- **Detail level:** {}\n\n", options.detail_level));
    prompt.push_str(RESEARCH_FORMAT);
    prompt
}
