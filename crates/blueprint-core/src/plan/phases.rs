//! Derive delivery phases from feature priorities.

use super::types::{Feature, Phase, Priority};

const HOURS_PER_WEEK: u64 = 40;

struct PhaseShape {
    priority: Priority,
    name: &'static str,
    deliverables: &'static [&'static str],
}

const SHAPES: [PhaseShape; 3] = [
    PhaseShape {
        priority: Priority::High,
        name: "Foundation",
        deliverables: &["Project setup and architecture", "Core feature set"],
    },
    PhaseShape {
        priority: Priority::Medium,
        name: "Enhancement",
        deliverables: &["Secondary features", "Integration testing"],
    },
    PhaseShape {
        priority: Priority::Low,
        name: "Polish & Launch",
        deliverables: &["Remaining features", "Launch checklist"],
    },
];

/// One phase per priority level that has features, in priority order.
///
/// Phase ids are numbered over the phases actually emitted.
pub fn derive_phases(features: &[Feature]) -> Vec<Phase> {
    let mut phases = Vec::new();
    for shape in &SHAPES {
        let members: Vec<&Feature> = features
            .iter()
            .filter(|f| f.priority == shape.priority)
            .collect();
        if members.is_empty() {
            continue;
        }

        let hours = members
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(u64::from(f.estimated_hours)));
        phases.push(Phase {
            id: format!("phase-{}", phases.len() + 1),
            name: shape.name.to_string(),
            features: members.iter().map(|f| f.id.clone()).collect(),
            estimated_duration: format_weeks(hours),
            milestones: members.iter().map(|f| format!("{} complete", f.name)).collect(),
            deliverables: shape.deliverables.iter().map(|d| d.to_string()).collect(),
        });
    }
    phases
}

fn format_weeks(hours: u64) -> String {
    let weeks = hours.div_ceil(HOURS_PER_WEEK).max(1);
    if weeks == 1 {
        "1 week".to_string()
    } else {
        format!("{weeks} weeks")
    }
}
