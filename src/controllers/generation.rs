use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::generation::{
        GenerationRequest, GenerationService, GenerationServiceApi, Quote, SubmittedGeneration,
    },
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct GenerationController {
    generation_service: Arc<GenerationService>,
}

impl GenerationController {
    pub fn new(generation_service: Arc<GenerationService>) -> Self {
        Self { generation_service }
    }

    /// POST /api/generations/quote
    pub async fn quote(
        State(controller): State<Arc<GenerationController>>,
        Extension(_auth_user): Extension<AuthUser>,
        Json(request): Json<GenerationRequest>,
    ) -> AppResult<Json<Quote>> {
        let quote = controller.generation_service.quote(request)?;
        Ok(Json(quote))
    }

    /// POST /api/generations - Reserve points and dispatch the job
    pub async fn submit(
        State(controller): State<Arc<GenerationController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<GenerationRequest>,
    ) -> AppResult<(StatusCode, Json<SubmittedGeneration>)> {
        let submitted = controller
            .generation_service
            .submit(&auth_user.user_id, request)
            .await?;
        Ok((StatusCode::ACCEPTED, Json(submitted)))
    }
}
