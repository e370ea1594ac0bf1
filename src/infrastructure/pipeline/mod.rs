pub mod http_pipeline;

pub use http_pipeline::HttpGenerationPipeline;

use crate::domain::generation::GenerationJob;
use async_trait::async_trait;
use uuid::Uuid;

/// Why a dispatch did not end with a confirmed hand-over
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The pipeline never took the job: refused outright or never reached
    #[error("pipeline rejected the job: {0}")]
    Rejected(String),
    /// The job may have been delivered; only the settlement callback can tell
    #[error("pipeline did not confirm the job: {0}")]
    Unconfirmed(String),
}

/// Downstream audio generation.
///
/// Dispatch only hands the job over; the pipeline reports the outcome later
/// through the settlement callback keyed by `task_id`.
#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    async fn dispatch(&self, task_id: Uuid, job: &GenerationJob) -> Result<(), DispatchError>;
}
