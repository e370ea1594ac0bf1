use super::error::LedgerError;
use super::model::{AppendCondition, NewTransaction, TransactionKind};
use super::policy::LedgerPolicy;
use super::recorder::TransactionRecorder;
use crate::infrastructure::repositories::LedgerStore;
use std::sync::Arc;

pub const SIGNUP_BONUS_DESCRIPTION: &str = "Signup bonus";

/// Outcome of provisioning a points account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionedAccount {
    pub already_existed: bool,
    pub balance: i64,
}

/// Idempotent account provisioning with a one-time signup bonus.
///
/// Uniqueness comes from the store twice over: `put_account_if_absent` creates the
/// row for exactly one caller, and the bonus is appended with `FirstOfKind` inside the
/// account's serialization point. A retry after a failed bonus write therefore heals
/// the account without ever paying twice.
pub struct AccountLifecycleManager {
    store: Arc<dyn LedgerStore>,
    recorder: Arc<TransactionRecorder>,
    policy: LedgerPolicy,
}

impl AccountLifecycleManager {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        recorder: Arc<TransactionRecorder>,
        policy: LedgerPolicy,
    ) -> Self {
        Self {
            store,
            recorder,
            policy,
        }
    }

    pub async fn ensure_account(
        &self,
        user_id: &str,
        bonus_amount: i64,
    ) -> Result<ProvisionedAccount, LedgerError> {
        if user_id.is_empty() {
            return Err(LedgerError::Invalid("User id is required".to_string()));
        }
        if bonus_amount < 0 {
            return Err(LedgerError::Invalid(
                "Signup bonus cannot be negative".to_string(),
            ));
        }

        // Zero opening balance: the bonus entry is what funds the account, so the
        // balance always equals the sum of the log
        let (_, created) = self
            .policy
            .run("put_account_if_absent", || {
                let store = self.store.clone();
                let user_id = user_id.to_string();
                async move { store.put_account_if_absent(&user_id, 0).await }
            })
            .await?;

        if created {
            tracing::info!(user_id = %user_id, "Points account created");
        }

        let bonus = NewTransaction::new(
            user_id,
            bonus_amount,
            TransactionKind::InitialBonus,
            SIGNUP_BONUS_DESCRIPTION,
        );

        let granted = self
            .recorder
            .record_if(bonus, AppendCondition::FirstOfKind)
            .await
            .map_err(|e| match e {
                err @ (LedgerError::AccountNotFound | LedgerError::Invalid(_)) => err,
                other => {
                    tracing::error!(
                        user_id = %user_id,
                        error = %other,
                        "Signup bonus write failed"
                    );
                    LedgerError::BonusGrantFailed(other.to_string())
                }
            })?;

        // First-time provisioning belongs to whichever call wrote the bonus,
        // which is not the creating call when its bonus write failed
        match granted {
            Some(transaction) => Ok(ProvisionedAccount {
                already_existed: false,
                balance: transaction.balance_after,
            }),
            None => Ok(ProvisionedAccount {
                already_existed: true,
                balance: self.current_balance(user_id).await?,
            }),
        }
    }

    async fn current_balance(&self, user_id: &str) -> Result<i64, LedgerError> {
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
}
