use super::ledger_store::{resettle, LedgerStore};
use crate::domain::points::{
    Account, AppendCondition, LedgerError, NewReservation, NewTransaction, Reservation,
    ReservationStatus, Settlement, Transaction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One account with its log and reservations, guarded by a single mutex
#[derive(Debug)]
struct AccountBook {
    account: Account,
    transactions: Vec<Transaction>,
    reservations: HashMap<Uuid, Reservation>,
}

impl AccountBook {
    fn new(user_id: &str, initial_balance: i64) -> Self {
        let now = Utc::now();
        Self {
            account: Account {
                user_id: user_id.to_string(),
                balance: initial_balance,
                created_at: now,
                updated_at: now,
            },
            transactions: Vec::new(),
            reservations: HashMap::new(),
        }
    }

    fn apply(&mut self, entry: NewTransaction) -> Result<Transaction, LedgerError> {
        let balance_after = self.account.balance + entry.amount;
        if balance_after < 0 {
            return Err(LedgerError::InsufficientBalance {
                balance: self.account.balance,
                requested: -entry.amount,
            });
        }

        let transaction = entry.into_transaction(balance_after);
        self.account.balance = balance_after;
        self.account.updated_at = transaction.created_at;
        self.transactions.push(transaction.clone());

        Ok(transaction)
    }
}

/// Process-local ledger store.
///
/// Account creation takes the registry write lock; every balance-affecting
/// operation holds only the owning account's mutex.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    books: RwLock<HashMap<String, Arc<Mutex<AccountBook>>>>,
    reservation_owners: RwLock<HashMap<Uuid, String>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, user_id: &str) -> Result<Arc<Mutex<AccountBook>>, LedgerError> {
        self.books
            .read()
            .get(user_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn get_account(&self, user_id: &str) -> Result<Option<Account>, LedgerError> {
        let book = self.books.read().get(user_id).cloned();
        Ok(book.map(|book| book.lock().account.clone()))
    }

    async fn put_account_if_absent(
        &self,
        user_id: &str,
        initial_balance: i64,
    ) -> Result<(Account, bool), LedgerError> {
        let mut books = self.books.write();
        if let Some(book) = books.get(user_id) {
            return Ok((book.lock().account.clone(), false));
        }

        let book = AccountBook::new(user_id, initial_balance);
        let account = book.account.clone();
        books.insert(user_id.to_string(), Arc::new(Mutex::new(book)));

        Ok((account, true))
    }

    async fn append_transaction(
        &self,
        transaction: NewTransaction,
        condition: AppendCondition,
    ) -> Result<Option<Transaction>, LedgerError> {
        let book = self.book(&transaction.user_id)?;
        let mut book = book.lock();

        let blocked = book
            .transactions
            .iter()
            .any(|existing| condition.is_blocked_by(transaction.kind, existing));
        if blocked {
            return Ok(None);
        }

        book.apply(transaction).map(Some)
    }

    async fn open_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<(Reservation, Transaction), LedgerError> {
        let book = self.book(&reservation.user_id)?;
        let (reservation, spend) = {
            let mut book = book.lock();
            let spend = book.apply(reservation.spend_transaction())?;
            let reservation = reservation.into_reservation(spend.id);
            book.reservations.insert(reservation.id, reservation.clone());
            (reservation, spend)
        };

        self.reservation_owners
            .write()
            .insert(reservation.id, reservation.user_id.clone());

        Ok((reservation, spend))
    }

    async fn settle_reservation(
        &self,
        reservation_id: Uuid,
        succeeded: bool,
    ) -> Result<Settlement, LedgerError> {
        let owner = self
            .reservation_owners
            .read()
            .get(&reservation_id)
            .cloned()
            .ok_or(LedgerError::ReservationNotFound)?;
        let book = self.book(&owner)?;
        let mut book = book.lock();

        let reservation = book
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or(LedgerError::ReservationNotFound)?;

        if reservation.is_settled() {
            resettle(&reservation, succeeded)?;
            return Ok(Settlement {
                reservation,
                refund: None,
                balance: book.account.balance,
                already_settled: true,
            });
        }

        let refund = if succeeded {
            None
        } else {
            Some(book.apply(reservation.refund_transaction())?)
        };

        let mut settled = reservation;
        settled.status = ReservationStatus::for_outcome(succeeded);
        settled.settled_at = Some(Utc::now());
        book.reservations.insert(settled.id, settled.clone());

        Ok(Settlement {
            reservation: settled,
            refund,
            balance: book.account.balance,
            already_settled: false,
        })
    }

    async fn get_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, LedgerError> {
        let owner = self.reservation_owners.read().get(&reservation_id).cloned();
        let Some(owner) = owner else {
            return Ok(None);
        };
        let book = self.book(&owner)?;
        let reservation = book.lock().reservations.get(&reservation_id).cloned();
        Ok(reservation)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let Some(book) = self.books.read().get(user_id).cloned() else {
            return Ok(Vec::new());
        };
        let book = book.lock();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        Ok(book.transactions.iter().rev().take(limit).cloned().collect())
    }

    async fn find_unsettled_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, LedgerError> {
        let books: Vec<_> = self.books.read().values().cloned().collect();
        let mut pending: Vec<Reservation> = books
            .iter()
            .flat_map(|book| {
                book.lock()
                    .reservations
                    .values()
                    .filter(|r| !r.is_settled() && r.created_at < created_before)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        pending.sort_by_key(|r| r.created_at);

        Ok(pending)
    }
}
