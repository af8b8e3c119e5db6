use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lesson plan
// ---------------------------------------------------------------------------

/// A structured lesson plan as produced by the model.
///
/// Field names are camelCase on the wire, matching what the model is asked to
/// emit and what the web client exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub subject: String,
    pub objective: String,
    /// Planned total length in minutes. Advisory: not checked against the
    /// section durations (see [`LessonPlan::duration_mismatch`]).
    pub total_duration: u32,
    /// Sections in presentation order.
    pub sections: Vec<LessonSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

/// One timed block of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSection {
    pub title: String,
    pub content: String,
    /// Length in minutes.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

impl LessonPlan {
    /// Sum of all section durations, in minutes. Widened so that arbitrary
    /// model output cannot overflow.
    pub fn section_minutes(&self) -> u64 {
        self.sections
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(u64::from(s.duration)))
    }

    /// Returns `(section_minutes, total_duration)` when the two disagree.
    pub fn duration_mismatch(&self) -> Option<(u64, u64)> {
        let sum = self.section_minutes();
        let total = u64::from(self.total_duration);
        (sum != total).then_some((sum, total))
    }

    /// Subject for display, with the product default for an empty subject.
    pub fn display_subject(&self) -> &str {
        let trimmed = self.subject.trim();
        if trimmed.is_empty() {
            "Plano de Aula"
        } else {
            trimmed
        }
    }

    /// Resources list, empty when absent.
    pub fn resources(&self) -> &[String] {
        self.resources.as_deref().unwrap_or_default()
    }
}

impl LessonSection {
    /// Activities list, empty when absent.
    pub fn activities(&self) -> &[String] {
        self.activities.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// History entry
// ---------------------------------------------------------------------------

/// A lesson plan saved to the history ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLesson {
    /// Opaque unique identifier (UUID v4 string).
    pub id: String,
    /// Copy of the plan taken at save time.
    pub lesson_plan: LessonPlan,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}
