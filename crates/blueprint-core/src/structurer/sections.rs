//! Section heuristics for free text.

use crate::plan::{ResearchResults, ResearchSection};

pub const MIN_TITLE_CHARS: usize = 3;
pub const MIN_BODY_CHARS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// Research bucket a section title maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchBucket {
    CompanyProfile,
    IndustryAnalysis,
    FeatureRecommendations,
    MarketTrends,
}

/// Split `text` into titled sections on blank-line boundaries.
///
/// The first line of a block is its title and the rest its body; a
/// single-line block splits at its first `:`. Blocks whose title or body is
/// too short are dropped.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        let line = line.trim();
        if !line.is_empty() {
            block.push(line);
            continue;
        }
        if let Some(section) = block_to_section(&block) {
            sections.push(section);
        }
        block.clear();
    }
    sections
}

fn block_to_section(lines: &[&str]) -> Option<Section> {
    let (title, body) = match lines {
        [] => return None,
        [only] => {
            let (title, body) = only.split_once(':')?;
            (title.to_string(), body.trim().to_string())
        }
        [first, rest @ ..] => (first.to_string(), rest.join("\n")),
    };

    let title = clean_title(&title);
    if title.chars().count() < MIN_TITLE_CHARS || body.chars().count() < MIN_BODY_CHARS {
        return None;
    }
    Some(Section { title, body })
}

/// Strip markdown heading markers, list numbering, bullets and bold markers.
fn clean_title(raw: &str) -> String {
    let unbolded = raw.replace("**", "").replace("__", "");
    let mut rest = unbolded.trim_start_matches('#').trim_start();

    rest = rest.trim_start_matches(['-', '*', '•']).trim_start();

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(stripped) = after.strip_prefix(['.', ')']) {
            rest = stripped.trim_start();
        }
    }

    rest.trim().trim_end_matches(':').trim_end().to_string()
}

/// Map a section title to a research bucket, if it names one.
pub fn classify(title: &str, company_name: &str) -> Option<ResearchBucket> {
    let lower = title.to_lowercase();

    if lower.contains("feature") {
        Some(ResearchBucket::FeatureRecommendations)
    } else if lower.contains("industry") {
        Some(ResearchBucket::IndustryAnalysis)
    } else if ["market", "competitor", "trend"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Some(ResearchBucket::MarketTrends)
    } else if lower.contains("company") || contains_words(&lower, &company_name.to_lowercase()) {
        Some(ResearchBucket::CompanyProfile)
    } else {
        None
    }
}

/// Whether the words of `needle` appear consecutively in `haystack`.
/// A blank needle never matches.
fn contains_words(haystack: &str, needle: &str) -> bool {
    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    };
    let needle = words(needle);
    if needle.is_empty() {
        return false;
    }
    words(haystack)
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Push `section` into the bucket it belongs to.
pub fn file_section(research: &mut ResearchResults, bucket: ResearchBucket, section: Section) {
    let entry = ResearchSection {
        title: section.title,
        body: section.body,
    };
    match bucket {
        ResearchBucket::CompanyProfile => research.company_profile.push(entry),
        ResearchBucket::IndustryAnalysis => research.industry_analysis.push(entry),
        ResearchBucket::FeatureRecommendations => research.feature_recommendations.push(entry),
        ResearchBucket::MarketTrends => research.market_trends.push(entry),
    }
}
