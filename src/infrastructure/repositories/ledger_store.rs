use crate::domain::points::{
    Account, AppendCondition, LedgerError, NewReservation, NewTransaction, Reservation,
    Settlement, Transaction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Durable storage for points accounts, their transaction log and open reservations.
///
/// Implementations must guarantee that:
/// - at most one account exists per user id, even under concurrent creation
/// - a transaction and the balance change it implies are applied as one atomic unit
/// - writes for the same user id are serialized (no interleaved read-check-write)
/// - writes for different user ids never wait on each other
///
/// No implicit retries happen here; callers own the retry and timeout policy.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Cheap round trip used by readiness probes
    async fn ping(&self) -> Result<(), LedgerError>;

    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, LedgerError>;

    /// Atomic create-or-fetch. The flag is true only for the caller that created the row.
    async fn put_account_if_absent(
        &self,
        user_id: &str,
        initial_balance: i64,
    ) -> Result<(Account, bool), LedgerError>;

    /// Append a transaction and move the balance by its amount.
    ///
    /// Returns `Ok(None)` without writing anything when `condition` is not met.
    ///
    /// # Errors
    /// `AccountNotFound` when the user has no account, `InsufficientBalance` when the
    /// resulting balance would be negative.
    async fn append_transaction(
        &self,
        transaction: NewTransaction,
        condition: AppendCondition,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Debit the reservation cost as a `spend` and persist the reservation as authorized
    async fn open_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<(Reservation, Transaction), LedgerError>;

    /// Move an authorized reservation to committed (`succeeded`) or released, refunding
    /// the cost on release
    async fn settle_reservation(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError>;

    async fn get_reservation(&self, reservation_id: Uuid)
        -> Result<Option<Reservation>, LedgerError>;

    /// Newest first
    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Reservations still authorized that were opened before the given instant
    async fn find_unsettled_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, LedgerError>;
}

/// Decide what to do with a reservation that is no longer authorized
pub(crate) fn resettle(
    reservation: &Reservation,
    succeeded: bool,
) -> Result<(), LedgerError> {
    let requested = crate::domain::points::ReservationStatus::for_outcome(succeeded);
    if reservation.status == requested {
        Ok(())
    } else {
        Err(LedgerError::ReservationAlreadySettled(
            reservation.status.to_string(),
        ))
    }
}
