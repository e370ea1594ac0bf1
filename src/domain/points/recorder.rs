use super::error::LedgerError;
use super::model::{
    AppendCondition, NewReservation, NewTransaction, Reservation, Settlement, Transaction,
    TransactionKind,
};
use super::policy::LedgerPolicy;
use crate::infrastructure::repositories::LedgerStore;
use std::sync::Arc;
use uuid::Uuid;

/// The only writer of transactions and balance changes.
///
/// Atomicity and per-account ordering come from the store; this layer validates
/// entries, applies the timeout/retry policy and logs every write.
pub struct TransactionRecorder {
    store: Arc<dyn LedgerStore>,
    policy: LedgerPolicy,
}

impl TransactionRecorder {
    pub fn new(store: Arc<dyn LedgerStore>, policy: LedgerPolicy) -> Self {
        Self { store, policy }
    }

    /// Append an unconditional entry
    pub async fn record(
        &self,
        user_id: &str,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        let entry = NewTransaction::new(user_id, amount, kind, description);
        self.record_if(entry, AppendCondition::Always)
            .await?
            .ok_or_else(|| LedgerError::Dependency("unconditional append was skipped".to_string()))
    }

    /// Append an entry unless `condition` is blocked by the account's existing log.
    /// Returns `None` when nothing was written.
    pub async fn record_if(
        &self,
        entry: NewTransaction,
        condition: AppendCondition,
    ) -> Result<Option<Transaction>, LedgerError> {
        Self::validate(&entry)?;

        let written = self
            .policy
            .run("append_transaction", || {
                let store = self.store.clone();
                let entry = entry.clone();
                async move { store.append_transaction(entry, condition).await }
            })
            .await?;

        match &written {
            Some(transaction) => tracing::info!(
                user_id = %transaction.user_id,
                transaction_id = %transaction.id,
                kind = %transaction.kind,
                amount = transaction.amount,
                balance_after = transaction.balance_after,
                "Points transaction recorded"
            ),
            None => tracing::debug!(
                user_id = %entry.user_id,
                kind = %entry.kind,
                "Points transaction skipped by append condition"
            ),
        }

        Ok(written)
    }

    /// Debit a reservation's cost and persist it as authorized, as one unit
    pub async fn open_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<(Reservation, Transaction), LedgerError> {
        if reservation.cost <= 0 {
            return Err(LedgerError::Invalid("Cost must be positive".to_string()));
        }
        if reservation.action_label.trim().is_empty() {
            return Err(LedgerError::Invalid("Action label is required".to_string()));
        }

        let (reservation, spend) = self
            .policy
            .run("open_reservation", || {
                let store = self.store.clone();
                let reservation = reservation.clone();
                async move { store.open_reservation(reservation).await }
            })
            .await?;

        tracing::info!(
            user_id = %reservation.user_id,
            reservation_id = %reservation.id,
            transaction_id = %spend.id,
            amount = spend.amount,
            balance_after = spend.balance_after,
            action = %reservation.action_label,
            "Points reserved"
        );

        Ok((reservation, spend))
    }

    /// Commit or release a reservation; release writes the refund
    pub async fn close_reservation(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError> {
        let settlement = self
            .policy
            .run("settle_reservation", || {
                let store = self.store.clone();
                async move { store.settle_reservation(reservation_id, succeeded).await }
            })
            .await?;

        tracing::info!(
            user_id = %settlement.reservation.user_id,
            reservation_id = %reservation_id,
            status = %settlement.reservation.status,
            refunded = settlement.refund.as_ref().map(|r| r.amount).unwrap_or(0),
            balance = settlement.balance,
            already_settled = settlement.already_settled,
            "Reservation settled"
        );

        Ok(settlement)
    }

    fn validate(entry: &NewTransaction) -> Result<(), LedgerError> {
        if entry.user_id.is_empty() {
            return Err(LedgerError::Invalid("User id is required".to_string()));
        }
        if !entry.kind.accepts_amount(entry.amount) {
            return Err(LedgerError::Invalid(format!(
                "Amount {} is not valid for a {} transaction",
                entry.amount, entry.kind
            )));
        }
        Ok(())
    }
}
