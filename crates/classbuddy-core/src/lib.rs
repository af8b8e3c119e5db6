//! Lesson generation, slide orchestration and document export.
//!
//! - [`lesson`]: prompt construction, response normalization and the
//!   generator tying them to a [`llm::ChatModel`].
//! - [`slides`]: the job-based presentation workflow against a
//!   [`slides::SlidesApi`].
//! - [`poll`]: the retry policy and polling primitive used by `slides`.
//! - [`export`]: PDF, PPTX and plain-text renderings of a plan.

pub mod export;
pub mod lesson;
pub mod llm;
pub mod poll;
pub mod slides;

pub use classbuddy_store::{LessonPlan, LessonSection, SavedLesson};
