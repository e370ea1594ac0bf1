use axum::{
    extract::{Query, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::domain::points::dto::{
    AccountResponse, BalanceResponse, CheckinResponse, HistoryQuery, TransactionResponse,
    TransactionsResponse, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
use crate::{
    domain::points::{PointsService, PointsServiceApi},
    error::{AppError, AppResult},
    infrastructure::auth::AuthUser,
};

pub struct PointsController {
    points_service: Arc<PointsService>,
}

impl PointsController {
    pub fn new(points_service: Arc<PointsService>) -> Self {
        Self { points_service }
    }

    /// POST /api/points/account - Provision the caller's account
    pub async fn ensure_account(
        State(controller): State<Arc<PointsController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<AccountResponse>> {
        let account = controller
            .points_service
            .ensure_account(&auth_user.user_id)
            .await?;
        Ok(Json(account.into()))
    }

    /// GET /api/points/balance
    pub async fn get_balance(
        State(controller): State<Arc<PointsController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<BalanceResponse>> {
        let balance = controller
            .points_service
            .get_balance(&auth_user.user_id)
            .await?;
        Ok(Json(BalanceResponse { balance }))
    }

    /// GET /api/points/transactions - Newest first
    pub async fn list_transactions(
        State(controller): State<Arc<PointsController>>,
        Extension(auth_user): Extension<AuthUser>,
        Query(query): Query<HistoryQuery>,
    ) -> AppResult<Json<TransactionsResponse>> {
        let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_HISTORY_LIMIT
            )));
        }

        let transactions = controller
            .points_service
            .list_transactions(&auth_user.user_id, limit)
            .await?;

        Ok(Json(TransactionsResponse {
            transactions: transactions
                .into_iter()
                .map(TransactionResponse::from)
                .collect(),
        }))
    }

    /// POST /api/points/checkin - Daily bonus, once per UTC day
    pub async fn checkin(
        State(controller): State<Arc<PointsController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<CheckinResponse>> {
        let bonus = controller
            .points_service
            .grant_daily_bonus(&auth_user.user_id)
            .await?;

        Ok(Json(CheckinResponse {
            awarded: bonus.awarded,
            balance: bonus.balance,
            next_checkin_at: bonus.next_checkin_at,
        }))
    }
}
