//! Lesson plan generation: request validation, prompt assembly, the model
//! call and reply normalization.

pub mod error;
pub mod generator;
pub mod normalize;
pub mod prompt;

pub use error::GenerateError;
pub use generator::LessonGenerator;
pub use normalize::{normalize_response, strip_code_fences};
pub use prompt::{LessonPrompt, LessonRequest, build_prompt};
