//! Plain-text rendering.

use crate::LessonPlan;

/// Render `plan` as a plain-text document suitable for pasting anywhere.
pub fn to_plain_text(plan: &LessonPlan) -> String {
    let mut out = String::new();

    heading(&mut out, "PLANO DE AULA", '=');
    out.push_str(&format!("Disciplina: {}\n", plan.display_subject()));
    out.push_str(&format!("Duração total: {} minutos\n", plan.total_duration));
    out.push_str(&format!("Seções: {}\n\n", plan.sections.len()));

    heading(&mut out, "OBJETIVO", '-');
    out.push_str(plan.objective.trim());
    out.push_str("\n\n");

    heading(&mut out, "SEÇÕES", '-');
    for (i, section) in plan.sections.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({} min)\n",
            i + 1,
            section.title.to_uppercase(),
            section.duration
        ));
        out.push_str(section.content.trim());
        out.push('\n');
        let activities = section.activities();
        if !activities.is_empty() {
            out.push_str("\nAtividades Práticas:\n");
            for activity in activities {
                out.push_str(&format!("  • {activity}\n"));
            }
        }
        out.push('\n');
    }

    if let Some(methodology) = plan.methodology.as_deref().filter(|s| !s.trim().is_empty()) {
        heading(&mut out, "METODOLOGIA", '-');
        out.push_str(methodology.trim());
        out.push_str("\n\n");
    }
    if let Some(evaluation) = plan.evaluation.as_deref().filter(|s| !s.trim().is_empty()) {
        heading(&mut out, "AVALIAÇÃO", '-');
        out.push_str(evaluation.trim());
        out.push_str("\n\n");
    }
    if !plan.resources().is_empty() {
        heading(&mut out, "RECURSOS", '-');
        for resource in plan.resources() {
            out.push_str(&format!("  • {resource}\n"));
        }
        out.push('\n');
    }

    heading(&mut out, "RESUMO DO PLANO", '-');
    for (i, section) in plan.sections.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {} minutos\n",
            i + 1,
            section.title,
            section.duration
        ));
    }
    out.push_str(&format!("\nTotal: {} minutos\n", plan.total_duration));
    out
}

fn heading(out: &mut String, title: &str, rule: char) {
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat_n(rule, title.chars().count()));
    out.push_str("\n\n");
}
