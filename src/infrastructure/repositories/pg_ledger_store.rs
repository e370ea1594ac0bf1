use super::ledger_store::{resettle, LedgerStore};
use crate::domain::points::{
    Account, AppendCondition, LedgerError, NewReservation, NewTransaction, Reservation,
    ReservationStatus, Settlement, Transaction, TransactionKind,
};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use uuid::Uuid;

/// PostgreSQL ledger store.
///
/// The account row lock (`SELECT ... FOR UPDATE`) is the per-account
/// serialization point; every write runs inside one database transaction.
pub struct PgLedgerStore {
    pool: Arc<DbPool>,
}

impl PgLedgerStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Lock the account row for the rest of the transaction and return its balance
    async fn lock_account(conn: &mut PgConnection, user_id: &str) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT balance FROM points_accounts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(LedgerError::AccountNotFound)
    }

    async fn prior_exists(
        conn: &mut PgConnection,
        user_id: &str,
        kind: TransactionKind,
        since: Option<DateTime<Utc>>,
    ) -> Result<bool, LedgerError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM points_transactions
                WHERE user_id = $1
                  AND kind = $2
                  AND ($3::timestamptz IS NULL OR created_at >= $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Write the entry and the new balance. The account row must already be locked.
    async fn write_entry(
        conn: &mut PgConnection,
        balance: i64,
        entry: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let balance_after = balance + entry.amount;
        if balance_after < 0 {
            return Err(LedgerError::InsufficientBalance {
                balance,
                requested: -entry.amount,
            });
        }

        let transaction = entry.into_transaction(balance_after);

        sqlx::query(
            r#"
            UPDATE points_accounts
            SET balance = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(&transaction.user_id)
        .bind(balance_after)
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO points_transactions
                (id, user_id, amount, kind, description, balance_after, reservation_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(transaction.balance_after)
        .bind(transaction.reservation_id)
        .bind(transaction.created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(transaction)
    }

    async fn current_balance(conn: &mut PgConnection, user_id: &str) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>("SELECT balance FROM points_accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(LedgerError::AccountNotFound)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, LedgerError> {
        let pool = self.pool.as_ref();
        let account = sqlx::query_as::<_, Account>(
            "SELECT user_id, balance, created_at, updated_at FROM points_accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    async fn put_account_if_absent(
        &self,
        user_id: &str,
        initial_balance: i64,
    ) -> Result<(Account, bool), LedgerError> {
        let pool = self.pool.as_ref();
        let now = Utc::now();

        // ON CONFLICT waits for a concurrent inserter to commit, so exactly one caller
        // sees its row returned
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO points_accounts (user_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING user_id, balance, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(initial_balance)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        if let Some(account) = created {
            return Ok((account, true));
        }

        let existing = self
            .get_account(user_id)
            .await?
            .ok_or(LedgerError::ConcurrencyConflict)?;

        Ok((existing, false))
    }

    async fn append_transaction(
        &self,
        transaction: NewTransaction,
        condition: AppendCondition,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut db_tx = self.pool.begin().await?;

        let balance = Self::lock_account(&mut db_tx, &transaction.user_id).await?;

        if condition != AppendCondition::Always
            && Self::prior_exists(
                &mut db_tx,
                &transaction.user_id,
                transaction.kind,
                condition.since(),
            )
            .await?
        {
            db_tx.rollback().await?;
            return Ok(None);
        }

        let written = Self::write_entry(&mut db_tx, balance, transaction).await?;
        db_tx.commit().await?;

        Ok(Some(written))
    }

    async fn open_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<(Reservation, Transaction), LedgerError> {
        let mut db_tx = self.pool.begin().await?;

        let balance = Self::lock_account(&mut db_tx, &reservation.user_id).await?;
        let spend = Self::write_entry(&mut db_tx, balance, reservation.spend_transaction()).await?;
        let pending = reservation.into_reservation(spend.id);

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO points_reservations
                (id, user_id, cost, action_label, status, spend_transaction_id, created_at, settled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL)
            RETURNING *
            "#,
        )
        .bind(pending.id)
        .bind(&pending.user_id)
        .bind(pending.cost)
        .bind(&pending.action_label)
        .bind(pending.status.as_str())
        .bind(pending.spend_transaction_id)
        .bind(pending.created_at)
        .fetch_one(&mut *db_tx)
        .await?;

        db_tx.commit().await?;

        Ok((reservation, spend))
    }

    async fn settle_reservation(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError> {
        let mut db_tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM points_reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_optional(&mut *db_tx)
        .await?
        .ok_or(LedgerError::ReservationNotFound)?;

        if reservation.is_settled() {
            resettle(&reservation, succeeded)?;
            let balance = Self::current_balance(&mut db_tx, &reservation.user_id).await?;
            db_tx.rollback().await?;
            return Ok(Settlement {
                reservation,
                refund: None,
                balance,
                already_settled: true,
            });
        }

        let refund = if succeeded {
            None
        } else {
            let balance = Self::lock_account(&mut db_tx, &reservation.user_id).await?;
            Some(Self::write_entry(&mut db_tx, balance, reservation.refund_transaction()).await?)
        };

        let status = ReservationStatus::for_outcome(succeeded);
        let settled = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE points_reservations
            SET status = $2, settled_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reservation_id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *db_tx)
        .await?;

        let balance = match &refund {
            Some(refund) => refund.balance_after,
            None => Self::current_balance(&mut db_tx, &settled.user_id).await?,
        };

        db_tx.commit().await?;

        Ok(Settlement {
            reservation: settled,
            refund,
            balance,
            already_settled: false,
        })
    }

    async fn get_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, LedgerError> {
        let pool = self.pool.as_ref();
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM points_reservations WHERE id = $1")
                .bind(reservation_id)
                .fetch_optional(pool)
                .await?;

        Ok(reservation)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let pool = self.pool.as_ref();
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM points_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    async fn find_unsettled_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, LedgerError> {
        let pool = self.pool.as_ref();
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM points_reservations
            WHERE status = 'authorized' AND created_at < $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(created_before)
        .fetch_all(pool)
        .await?;

        Ok(reservations)
    }
}
