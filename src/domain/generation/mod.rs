pub mod error;
pub mod model;
pub mod pricing;
pub mod service;

pub use error::GenerationServiceError;
pub use model::{GenerationJob, GenerationMode, GenerationRequest, TtsProvider};
pub use pricing::{CostSchedule, Quote};
pub use service::{DispatchStatus, GenerationService, GenerationServiceApi, SubmittedGeneration};
