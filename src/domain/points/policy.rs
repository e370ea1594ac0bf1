use super::error::LedgerError;
use std::future::Future;
use std::time::Duration;

/// Timeout and conflict-retry budget applied to every ledger store call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerPolicy {
    pub op_timeout: Duration,
    pub max_conflict_retries: u32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(3),
            max_conflict_retries: 3,
        }
    }
}

impl LedgerPolicy {
    pub fn new(op_timeout: Duration, max_conflict_retries: u32) -> Self {
        Self {
            op_timeout,
            max_conflict_retries,
        }
    }

    /// Run a store operation under the policy.
    ///
    /// Each attempt is bounded by `op_timeout`; an elapsed attempt is reported as
    /// `Timeout` and never retried, since the write may still land. `ConcurrencyConflict`
    /// is retried up to `max_conflict_retries` times.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut conflicts = 0;
        loop {
            match tokio::time::timeout(self.op_timeout, attempt()).await {
                Ok(Err(LedgerError::ConcurrencyConflict))
                    if conflicts < self.max_conflict_retries =>
                {
                    conflicts += 1;
                    tracing::warn!(
                        operation = operation,
                        attempt = conflicts,
                        "Ledger conflict, retrying"
                    );
                }
                Ok(result) => return result,
                Err(_) => {
                    tracing::warn!(
                        operation = operation,
                        timeout_ms = self.op_timeout.as_millis() as u64,
                        "Ledger operation timed out"
                    );
                    return Err(LedgerError::Timeout);
                }
            }
        }
    }
}
