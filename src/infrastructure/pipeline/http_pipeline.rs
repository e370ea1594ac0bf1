use super::{DispatchError, GenerationPipeline};
use crate::domain::generation::{GenerationJob, GenerationMode, TtsProvider};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct DispatchPayload<'a> {
    task_id: Uuid,
    provider: TtsProvider,
    mode: GenerationMode,
    content: &'a str,
    voices: &'a [String],
    language: &'a str,
    usetime: &'a str,
    callback_url: String,
}

/// Generation pipeline reached over HTTP
pub struct HttpGenerationPipeline {
    base_url: String,
    public_base_url: String,
    callback_token: String,
    http_client: reqwest::Client,
}

impl HttpGenerationPipeline {
    pub fn new(
        base_url: &str,
        public_base_url: &str,
        callback_token: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            callback_token,
            http_client,
        })
    }

    fn callback_url(&self, task_id: Uuid) -> String {
        format!(
            "{}/internal/reservations/{}/settle",
            self.public_base_url, task_id
        )
    }
}

#[async_trait]
impl GenerationPipeline for HttpGenerationPipeline {
    async fn dispatch(&self, task_id: Uuid, job: &GenerationJob) -> Result<(), DispatchError> {
        let start_time = std::time::Instant::now();
        let payload = DispatchPayload {
            task_id,
            provider: job.provider,
            mode: job.mode,
            content: &job.content,
            voices: &job.voices,
            language: &job.language,
            usetime: &job.usetime,
            callback_url: self.callback_url(task_id),
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .bearer_auth(&self.callback_token)
            .json(&payload)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DispatchError::Rejected(format!(
                "Pipeline returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!(
            task_id = %task_id,
            provider = %job.provider,
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Generation job dispatched"
        );

        Ok(())
    }
}

/// Only a failure to connect proves the request never left; a timeout or a
/// broken stream after that may still have delivered the job.
fn classify_send_error(err: reqwest::Error) -> DispatchError {
    if err.is_connect() || err.is_builder() {
        DispatchError::Rejected(format!("Pipeline unreachable: {}", err))
    } else {
        DispatchError::Unconfirmed(format!("Pipeline request failed: {}", err))
    }
}
