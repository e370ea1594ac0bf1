use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{domain::auth::JwtManager, error::AppError};

/// User context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))
}

/// Authenticates end users with the identity provider's JWT
pub async fn auth_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let user_id = jwt_manager.extract_user_id(token)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Constant-time for equal lengths; the length itself is not secret
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Shared secret presented by the generation pipeline on settlement callbacks
#[derive(Clone)]
pub struct PipelineToken(pub Arc<str>);

pub async fn pipeline_auth_middleware(
    State(expected): State<PipelineToken>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    if !token_matches(token, &expected.0) {
        tracing::warn!("Rejected settlement callback with an invalid pipeline token");
        return Err(AppError::Unauthorized("Invalid pipeline token".to_string()));
    }

    Ok(next.run(request).await)
}
