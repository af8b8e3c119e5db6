//! Markdown input text submitted to the presentation API.

use crate::LessonPlan;

/// Upper bound on requested cards.
pub const MAX_CARDS: u32 = 15;
/// Cards requested for a plan with no sections.
pub const DEFAULT_CARDS: u32 = 8;

/// Render `plan` as the markdown outline the generator expands into slides.
pub fn build_input_text(plan: &LessonPlan) -> String {
    let mut text = format!(
        "# {}\n\n## Objetivo\n{}\n\n",
        plan.display_subject(),
        plan.objective
    );
    for (i, section) in plan.sections.iter().enumerate() {
        text.push_str(&format!(
            "## {}. {} ({} min)\n{}\n\n",
            i + 1,
            section.title,
            section.duration,
            section.content
        ));
        let activities = section.activities();
        if !activities.is_empty() {
            text.push_str("### Atividades Práticas\n");
            for activity in activities {
                text.push_str(&format!("- {activity}\n"));
            }
            text.push('\n');
        }
    }
    text
}

/// Cards to request: one per section plus cover and closing, capped.
pub fn card_count(plan: &LessonPlan) -> u32 {
    if plan.sections.is_empty() {
        return DEFAULT_CARDS;
    }
    let sections = u32::try_from(plan.sections.len()).unwrap_or(u32::MAX);
    sections.saturating_add(2).min(MAX_CARDS)
}
