use async_trait::async_trait;

use super::error::SlidesError;
use super::types::{
    CreatedGeneration, ExportFormat, ExportSnapshot, ExportTicket, GenerationRequest,
    GenerationSnapshot,
};

/// The four calls of the job-based presentation API.
///
/// Each method is one HTTP round trip; polling and sequencing live in
/// [`super::SlideOrchestrator`].
#[async_trait]
pub trait SlidesApi: Send + Sync {
    async fn create_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<CreatedGeneration, SlidesError>;

    async fn generation_status(&self, generation_id: &str)
    -> Result<GenerationSnapshot, SlidesError>;

    async fn request_export(
        &self,
        generation_id: &str,
        format: ExportFormat,
    ) -> Result<ExportTicket, SlidesError>;

    async fn export_status(
        &self,
        generation_id: &str,
        export_id: &str,
    ) -> Result<ExportSnapshot, SlidesError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn SlidesApi) {}
};
