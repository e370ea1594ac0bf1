use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's points account. Mutated only through the transaction recorder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Account {
    pub user_id: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    InitialBonus,
    DailyCheckin,
    Spend,
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::InitialBonus => "initial_bonus",
            TransactionKind::DailyCheckin => "daily_checkin",
            TransactionKind::Spend => "spend",
            TransactionKind::Refund => "refund",
        }
    }

    /// Whether an amount has the sign this kind requires.
    /// Spends are strictly negative, everything else credits (zero allowed for bonuses).
    pub fn accepts_amount(&self, amount: i64) -> bool {
        match self {
            TransactionKind::Spend => amount < 0,
            TransactionKind::Refund => amount > 0,
            TransactionKind::InitialBonus | TransactionKind::DailyCheckin => amount >= 0,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger entry. Refunds are new entries, never edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub balance_after: i64,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A transaction that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub reservation_id: Option<Uuid>,
}

impl NewTransaction {
    pub fn new(user_id: &str, amount: i64, kind: TransactionKind, description: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount,
            kind,
            description: description.to_string(),
            reservation_id: None,
        }
    }

    /// Materialize the entry once the store has computed the resulting balance
    pub fn into_transaction(self, balance_after: i64) -> Transaction {
        Transaction {
            id: Uuid::now_v7(),
            user_id: self.user_id,
            amount: self.amount,
            kind: self.kind,
            description: self.description,
            balance_after,
            reservation_id: self.reservation_id,
            created_at: Utc::now(),
        }
    }
}

/// Guard evaluated by the store inside the account's serialization point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppendCondition {
    Always,
    /// Skip if the account already has any transaction of the same kind
    FirstOfKind,
    /// Skip if the account has a transaction of the same kind at or after the instant
    FirstOfKindSince(DateTime<Utc>),
}

impl AppendCondition {
    /// Returns true when `existing` blocks an append of `kind`
    pub fn is_blocked_by(&self, kind: TransactionKind, existing: &Transaction) -> bool {
        match self {
            AppendCondition::Always => false,
            AppendCondition::FirstOfKind => existing.kind == kind,
            AppendCondition::FirstOfKindSince(since) => {
                existing.kind == kind && existing.created_at >= *since
            }
        }
    }

    /// Lower bound used by SQL-backed stores; `None` means "any time"
    pub fn since(&self) -> Option<DateTime<Utc>> {
        match self {
            AppendCondition::FirstOfKindSince(since) => Some(*since),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Authorized,
    Committed,
    Released,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Authorized => "authorized",
            ReservationStatus::Committed => "committed",
            ReservationStatus::Released => "released",
        }
    }

    /// Final status for a job outcome
    pub fn for_outcome(succeeded: bool) -> Self {
        if succeeded {
            ReservationStatus::Committed
        } else {
            ReservationStatus::Released
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Credits debited up front for a costly job, awaiting the job's outcome
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: String,
    pub cost: i64,
    pub action_label: String,
    pub status: ReservationStatus,
    pub spend_transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_settled(&self) -> bool {
        self.status != ReservationStatus::Authorized
    }

    /// The refund entry that releases this reservation
    pub fn refund_transaction(&self) -> NewTransaction {
        NewTransaction {
            user_id: self.user_id.clone(),
            amount: self.cost,
            kind: TransactionKind::Refund,
            description: format!("Refund: {}", self.action_label),
            reservation_id: Some(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub id: Uuid,
    pub user_id: String,
    pub cost: i64,
    pub action_label: String,
}

impl NewReservation {
    pub fn new(user_id: &str, cost: i64, action_label: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            cost,
            action_label: action_label.to_string(),
        }
    }

    /// The spend entry that opens this reservation
    pub fn spend_transaction(&self) -> NewTransaction {
        NewTransaction {
            user_id: self.user_id.clone(),
            amount: -self.cost,
            kind: TransactionKind::Spend,
            description: self.action_label.clone(),
            reservation_id: Some(self.id),
        }
    }

    pub fn into_reservation(self, spend_transaction_id: Uuid) -> Reservation {
        Reservation {
            id: self.id,
            user_id: self.user_id,
            cost: self.cost,
            action_label: self.action_label,
            status: ReservationStatus::Authorized,
            spend_transaction_id,
            created_at: Utc::now(),
            settled_at: None,
        }
    }
}

/// Result of settling a reservation
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub reservation: Reservation,
    pub refund: Option<Transaction>,
    pub balance: i64,
    /// True when the reservation had already reached the requested outcome
    pub already_settled: bool,
}
