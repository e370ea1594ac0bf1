use async_trait::async_trait;
use parking_lot::Mutex;
use podcast_points_backend::domain::generation::GenerationJob;
use podcast_points_backend::infrastructure::pipeline::{DispatchError, GenerationPipeline};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Pipeline double that records dispatched jobs. It can refuse jobs, or take
/// them and then lose the acknowledgement.
#[derive(Default)]
pub struct MockPipeline {
    reject: AtomicBool,
    drop_acks: AtomicBool,
    dispatched: Mutex<Vec<(Uuid, GenerationJob)>>,
}

#[allow(dead_code)]
impl MockPipeline {
    pub fn reject_jobs(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn drop_acknowledgements(&self, drop_acks: bool) {
        self.drop_acks.store(drop_acks, Ordering::SeqCst);
    }

    pub fn dispatched(&self) -> Vec<(Uuid, GenerationJob)> {
        self.dispatched.lock().clone()
    }
}

#[async_trait]
impl GenerationPipeline for MockPipeline {
    async fn dispatch(&self, task_id: Uuid, job: &GenerationJob) -> Result<(), DispatchError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(DispatchError::Rejected(
                "pipeline returned 503 Service Unavailable".to_string(),
            ));
        }
        self.dispatched.lock().push((task_id, job.clone()));
        if self.drop_acks.load(Ordering::SeqCst) {
            return Err(DispatchError::Unconfirmed(
                "operation timed out".to_string(),
            ));
        }
        Ok(())
    }
}
