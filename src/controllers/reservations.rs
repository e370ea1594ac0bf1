use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::points::dto::{ReservationResponse, SettleRequest, SettlementResponse};
use crate::{
    domain::points::{LedgerError, PointsService, PointsServiceApi},
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct ReservationController {
    points_service: Arc<PointsService>,
}

impl ReservationController {
    pub fn new(points_service: Arc<PointsService>) -> Self {
        Self { points_service }
    }

    /// GET /api/reservations/{id} - Only visible to the owner
    pub async fn get_reservation(
        State(controller): State<Arc<ReservationController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(reservation_id): Path<Uuid>,
    ) -> AppResult<Json<ReservationResponse>> {
        let reservation = controller
            .points_service
            .get_reservation(reservation_id)
            .await?;

        if reservation.user_id != auth_user.user_id {
            return Err(LedgerError::ReservationNotFound.into());
        }

        Ok(Json(reservation.into()))
    }

    /// POST /internal/reservations/{id}/settle - Pipeline outcome callback
    pub async fn settle(
        State(controller): State<Arc<ReservationController>>,
        Path(reservation_id): Path<Uuid>,
        Json(request): Json<SettleRequest>,
    ) -> AppResult<Json<SettlementResponse>> {
        let settlement = controller
            .points_service
            .settle(reservation_id, request.succeeded)
            .await?;
        Ok(Json(settlement.into()))
    }
}
