use crate::domain::points::LedgerError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("content has {actual} characters, the limit is {max}")]
    ContentTooLarge { max: usize, actual: usize },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("generation pipeline rejected the job: {0}")]
    PipelineRejected(String),
}

impl From<GenerationServiceError> for AppError {
    fn from(err: GenerationServiceError) -> Self {
        match err {
            GenerationServiceError::Invalid(msg) => AppError::BadRequest(msg),
            GenerationServiceError::ContentTooLarge { .. } => {
                AppError::PayloadTooLarge(err.to_string())
            }
            GenerationServiceError::Ledger(e) => e.into(),
            GenerationServiceError::PipelineRejected(msg) => AppError::ExternalService(msg),
        }
    }
}
