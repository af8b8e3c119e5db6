//! Slide generation through a job-based presentation API.
//!
//! [`SlidesApi`] is the seam over the remote API, [`GammaClient`] its HTTP
//! implementation and [`SlideOrchestrator`] the submit/poll/export workflow.

pub mod api;
pub mod error;
pub mod gamma;
pub mod input;
pub mod orchestrator;
pub mod types;

pub use api::SlidesApi;
pub use error::SlidesError;
pub use gamma::{GammaClient, GammaConfig};
pub use input::{build_input_text, card_count};
pub use orchestrator::{OrchestratorConfig, SlideOrchestrator};
pub use types::{
    CreatedGeneration, ExportFormat, ExportSnapshot, ExportTicket, GenerationRequest,
    GenerationSnapshot, GenerationStatus, SlideDeckLinks,
};
