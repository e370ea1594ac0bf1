use super::error::LedgerError;
use super::model::{
    AppendCondition, NewReservation, NewTransaction, Reservation, Settlement, Transaction,
    TransactionKind,
};
use super::recorder::TransactionRecorder;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const DAILY_CHECKIN_DESCRIPTION: &str = "Daily check-in";

/// Pre-flight authorization and settlement for costly actions.
///
/// `Requested -> Authorized -> (Committed | Released)`. Authorization debits
/// immediately; a failed job is released with a refund of the same amount.
pub struct SpendAuthorizationGate {
    recorder: Arc<TransactionRecorder>,
}

impl SpendAuthorizationGate {
    pub fn new(recorder: Arc<TransactionRecorder>) -> Self {
        Self { recorder }
    }

    /// Debit `cost` and open a reservation for the action
    pub async fn authorize(
        &self,
        user_id: &str,
        cost: i64,
        action_label: &str,
    ) -> Result<(Reservation, Transaction), LedgerError> {
        self.recorder
            .open_reservation(NewReservation::new(user_id, cost, action_label))
            .await
    }

    /// Close a reservation with the downstream job's outcome
    pub async fn settle(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError> {
        self.recorder
            .close_reservation(reservation_id, succeeded)
            .await
    }

    /// Credit the daily check-in once per UTC calendar day
    pub async fn grant_daily_bonus(
        &self,
        user_id: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let entry = NewTransaction::new(
            user_id,
            amount,
            TransactionKind::DailyCheckin,
            DAILY_CHECKIN_DESCRIPTION,
        );

        self.recorder
            .record_if(entry, AppendCondition::FirstOfKindSince(start_of_day(now)))
            .await?
            .ok_or(LedgerError::AlreadyClaimedToday)
    }
}

/// Midnight UTC of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Midnight UTC of the following day, when the next check-in opens
pub fn next_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) + Duration::days(1)
}
