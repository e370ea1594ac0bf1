use super::error::GenerationServiceError;
use super::model::{GenerationJob, GenerationRequest, DEFAULT_LANGUAGE, DEFAULT_USETIME};
use super::pricing::{CostSchedule, Quote};
use crate::domain::points::PointsServiceApi;
use crate::infrastructure::pipeline::{DispatchError, GenerationPipeline};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Whether the pipeline confirmed it took the job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Accepted,
    /// Delivery unknown; the reservation stays authorized until settled
    Unconfirmed,
}

/// Response for POST /api/generations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmittedGeneration {
    pub reservation_id: Uuid,
    pub cost: i64,
    pub balance: i64,
    pub dispatch: DispatchStatus,
}

pub struct GenerationService {
    points: Arc<dyn PointsServiceApi>,
    pipeline: Arc<dyn GenerationPipeline>,
    schedule: CostSchedule,
    max_content_chars: usize,
}

impl GenerationService {
    pub fn new(
        points: Arc<dyn PointsServiceApi>,
        pipeline: Arc<dyn GenerationPipeline>,
        schedule: CostSchedule,
        max_content_chars: usize,
    ) -> Self {
        Self {
            points,
            pipeline,
            schedule,
            max_content_chars,
        }
    }

    fn validate(&self, request: GenerationRequest) -> Result<GenerationJob, GenerationServiceError> {
        if request.content.trim().is_empty() {
            return Err(GenerationServiceError::Invalid(
                "Content is required".to_string(),
            ));
        }

        let actual = request.content.chars().count();
        if actual > self.max_content_chars {
            return Err(GenerationServiceError::ContentTooLarge {
                max: self.max_content_chars,
                actual,
            });
        }

        if request.voices.is_empty() || request.voices.iter().any(|v| v.trim().is_empty()) {
            return Err(GenerationServiceError::Invalid(
                "At least one speaker voice is required".to_string(),
            ));
        }

        let language = request
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let usetime = request
            .usetime
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USETIME.to_string());

        Ok(GenerationJob {
            provider: request.provider,
            mode: request.mode,
            content: request.content,
            voices: request.voices,
            language,
            usetime,
        })
    }
}

#[async_trait]
pub trait GenerationServiceApi: Send + Sync {
    /// Price a job without touching the ledger
    fn quote(&self, request: GenerationRequest) -> Result<Quote, GenerationServiceError>;

    /// Reserve the job's cost and hand it to the pipeline.
    ///
    /// A job the pipeline refuses is refunded before the error is returned.
    /// A job it may have received is left authorized for the callback.
    async fn submit(
        &self,
        user_id: &str,
        request: GenerationRequest,
    ) -> Result<SubmittedGeneration, GenerationServiceError>;
}

#[async_trait]
impl GenerationServiceApi for GenerationService {
    fn quote(&self, request: GenerationRequest) -> Result<Quote, GenerationServiceError> {
        let job = self.validate(request)?;
        Ok(self.schedule.quote(&job.usetime))
    }

    async fn submit(
        &self,
        user_id: &str,
        request: GenerationRequest,
    ) -> Result<SubmittedGeneration, GenerationServiceError> {
        let job = self.validate(request)?;
        let quote = self.schedule.quote(&job.usetime);

        tracing::info!(
            user_id = %user_id,
            provider = %job.provider,
            minutes = quote.minutes,
            cost = quote.cost,
            content_length = job.content.len(),
            "Generation request"
        );

        let authorization = self
            .points
            .authorize_and_spend(user_id, quote.cost, &job.action_label())
            .await?;
        let reservation_id = authorization.reservation.id;

        let dispatch = match self.pipeline.dispatch(reservation_id, &job).await {
            Ok(()) => DispatchStatus::Accepted,
            Err(DispatchError::Rejected(reason)) => {
                tracing::warn!(
                    user_id = %user_id,
                    reservation_id = %reservation_id,
                    error = %reason,
                    "Pipeline rejected job, refunding"
                );
                self.points.settle(reservation_id, false).await?;
                return Err(GenerationServiceError::PipelineRejected(reason));
            }
            Err(DispatchError::Unconfirmed(reason)) => {
                tracing::warn!(
                    user_id = %user_id,
                    reservation_id = %reservation_id,
                    error = %reason,
                    "Pipeline did not confirm job, leaving reservation open"
                );
                DispatchStatus::Unconfirmed
            }
        };

        Ok(SubmittedGeneration {
            reservation_id,
            cost: quote.cost,
            balance: authorization.balance,
            dispatch,
        })
    }
}
