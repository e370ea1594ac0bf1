use super::lifecycle::ProvisionedAccount;
use super::model::{Reservation, ReservationStatus, Settlement, Transaction, TransactionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Response for POST /api/points/account
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub already_existed: bool,
    pub balance: i64,
}

impl From<ProvisionedAccount> for AccountResponse {
    fn from(account: ProvisionedAccount) -> Self {
        Self {
            already_existed: account.already_existed,
            balance: account.balance,
        }
    }
}

/// Response for GET /api/points/balance
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub balance_after: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            amount: transaction.amount,
            kind: transaction.kind,
            description: transaction.description,
            balance_after: transaction.balance_after,
            reservation_id: transaction.reservation_id,
            created_at: transaction.created_at,
        }
    }
}

/// Response for GET /api/points/transactions
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

/// Response for POST /api/points/checkin
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub awarded: i64,
    pub balance: i64,
    pub next_checkin_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub cost: i64,
    pub action_label: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id,
            cost: reservation.cost,
            action_label: reservation.action_label,
            status: reservation.status,
            created_at: reservation.created_at,
            settled_at: reservation.settled_at,
        }
    }
}

/// Request body for POST /internal/reservations/:id/settle
#[derive(Debug, Serialize, Deserialize)]
pub struct SettleRequest {
    pub succeeded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub reservation_id: Uuid,
    pub status: ReservationStatus,
    pub refunded: i64,
    pub balance: i64,
    pub already_settled: bool,
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            reservation_id: settlement.reservation.id,
            status: settlement.reservation.status,
            refunded: settlement.refund.map(|r| r.amount).unwrap_or(0),
            balance: settlement.balance,
            already_settled: settlement.already_settled,
        }
    }
}
