use super::error::LedgerError;
use super::gate::{next_day_start, SpendAuthorizationGate};
use super::lifecycle::{AccountLifecycleManager, ProvisionedAccount};
use super::model::{Reservation, Settlement, Transaction};
use super::policy::LedgerPolicy;
use super::recorder::TransactionRecorder;
use crate::infrastructure::repositories::LedgerStore;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Amounts credited by the points system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsSettings {
    pub signup_bonus: i64,
    pub daily_checkin_points: i64,
}

impl Default for PointsSettings {
    fn default() -> Self {
        Self {
            signup_bonus: 100,
            daily_checkin_points: 10,
        }
    }
}

/// A successful pre-flight debit
#[derive(Debug, Clone, PartialEq)]
pub struct SpendAuthorization {
    pub reservation: Reservation,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBonus {
    pub awarded: i64,
    pub balance: i64,
    pub next_checkin_at: chrono::DateTime<Utc>,
}

pub struct PointsService {
    store: Arc<dyn LedgerStore>,
    policy: LedgerPolicy,
    lifecycle: AccountLifecycleManager,
    gate: SpendAuthorizationGate,
    settings: PointsSettings,
}

impl PointsService {
    pub fn new(store: Arc<dyn LedgerStore>, policy: LedgerPolicy, settings: PointsSettings) -> Self {
        let recorder = Arc::new(TransactionRecorder::new(store.clone(), policy));
        Self {
            lifecycle: AccountLifecycleManager::new(store.clone(), recorder.clone(), policy),
            gate: SpendAuthorizationGate::new(recorder),
            store,
            policy,
            settings,
        }
    }

    pub fn settings(&self) -> PointsSettings {
        self.settings
    }
}

#[async_trait]
pub trait PointsServiceApi: Send + Sync {
    /// Provision the caller's account, crediting the signup bonus exactly once
    async fn ensure_account(&self, user_id: &str) -> Result<ProvisionedAccount, LedgerError>;

    async fn get_balance(&self, user_id: &str) -> Result<i64, LedgerError>;

    /// Most recent transactions first
    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Debit `cost` before a costly job is dispatched.
    ///
    /// The debit is final until `settle` is called for the returned reservation;
    /// cancelling the caller afterwards does not roll it back.
    async fn authorize_and_spend(
        &self,
        user_id: &str,
        cost: i64,
        action_label: &str,
    ) -> Result<SpendAuthorization, LedgerError>;

    /// Record the job outcome; a failure refunds the reserved cost
    async fn settle(&self, reservation_id: Uuid, succeeded: bool)
        -> Result<Settlement, LedgerError>;

    async fn grant_daily_bonus(&self, user_id: &str) -> Result<DailyBonus, LedgerError>;

    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation, LedgerError>;

    /// Reservations still authorized after `older_than`, for out-of-band reconciliation
    async fn pending_reservations(
        &self,
        older_than: Duration,
    ) -> Result<Vec<Reservation>, LedgerError>;
}

#[async_trait]
impl PointsServiceApi for PointsService {
    async fn ensure_account(&self, user_id: &str) -> Result<ProvisionedAccount, LedgerError> {
        self.lifecycle
            .ensure_account(user_id, self.settings.signup_bonus)
            .await
    }

    async fn get_balance(&self, user_id: &str) -> Result<i64, LedgerError> {
        self.policy
            .run("get_account", || {
                let store = self.store.clone();
                let user_id = user_id.to_string();
                async move { store.get_account(&user_id).await }
            })
            .await?
            .map(|account| account.balance)
            .ok_or(LedgerError::AccountNotFound)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        if limit <= 0 {
            return Err(LedgerError::Invalid("Limit must be positive".to_string()));
        }

        self.policy
            .run("list_transactions", || {
                let store = self.store.clone();
                let user_id = user_id.to_string();
                async move { store.list_transactions(&user_id, limit).await }
            })
            .await
    }

    async fn authorize_and_spend(
        &self,
        user_id: &str,
        cost: i64,
        action_label: &str,
    ) -> Result<SpendAuthorization, LedgerError> {
        let (reservation, spend) = self.gate.authorize(user_id, cost, action_label).await?;

        Ok(SpendAuthorization {
            reservation,
            balance: spend.balance_after,
        })
    }

    async fn settle(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError> {
        self.gate.settle(reservation_id, succeeded).await
    }

    async fn grant_daily_bonus(&self, user_id: &str) -> Result<DailyBonus, LedgerError> {
        let now = Utc::now();
        let transaction = self
            .gate
            .grant_daily_bonus(user_id, self.settings.daily_checkin_points, now)
            .await?;

        Ok(DailyBonus {
            awarded: transaction.amount,
            balance: transaction.balance_after,
            next_checkin_at: next_day_start(now),
        })
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation, LedgerError> {
        self.policy
            .run("get_reservation", || {
                let store = self.store.clone();
                async move { store.get_reservation(reservation_id).await }
            })
            .await?
            .ok_or(LedgerError::ReservationNotFound)
    }

    async fn pending_reservations(
        &self,
        older_than: Duration,
    ) -> Result<Vec<Reservation>, LedgerError> {
        let cutoff = Utc::now() - older_than;
        self.policy
            .run("find_unsettled_reservations", || {
                let store = self.store.clone();
                async move { store.find_unsettled_reservations(cutoff).await }
            })
            .await
    }
}
