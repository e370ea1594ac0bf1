use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("points account not found")]
    AccountNotFound,
    #[error("insufficient balance: available {balance}, requested {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },
    #[error("signup bonus could not be granted: {0}")]
    BonusGrantFailed(String),
    #[error("concurrent update conflict")]
    ConcurrencyConflict,
    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("ledger operation timed out")]
    Timeout,
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("reservation already settled as {0}")]
    ReservationAlreadySettled(String),
    #[error("daily check-in already claimed today")]
    AlreadyClaimedToday,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl LedgerError {
    /// Transient failures the caller may retry without side effects
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::BonusGrantFailed(_)
                | LedgerError::ConcurrencyConflict
                | LedgerError::StoreUnavailable(_)
                | LedgerError::Timeout
        )
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => LedgerError::StoreUnavailable(err.to_string()),
            sqlx::Error::Database(db_err) => {
                // 40001 serialization_failure, 40P01 deadlock_detected
                let conflict = db_err.is_unique_violation()
                    || matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"));
                if conflict {
                    LedgerError::ConcurrencyConflict
                } else {
                    LedgerError::Dependency(err.to_string())
                }
            }
            _ => LedgerError::Dependency(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound => {
                AppError::NotFound("Points account not found".to_string())
            }
            LedgerError::ReservationNotFound => {
                AppError::NotFound("Reservation not found".to_string())
            }
            LedgerError::InsufficientBalance { balance, requested } => {
                AppError::PaymentRequired(format!(
                    "Insufficient points. Available: {}, Required: {}",
                    balance, requested
                ))
            }
            LedgerError::AlreadyClaimedToday => {
                AppError::Conflict("Daily check-in already claimed today".to_string())
            }
            LedgerError::ReservationAlreadySettled(status) => {
                AppError::Conflict(format!("Reservation already settled as {}", status))
            }
            LedgerError::Invalid(msg) => AppError::BadRequest(msg),
            err @ (LedgerError::BonusGrantFailed(_)
            | LedgerError::ConcurrencyConflict
            | LedgerError::StoreUnavailable(_)
            | LedgerError::Timeout) => AppError::ServiceUnavailable(err.to_string()),
            LedgerError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
