// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::access::Principal};

// O middleware em si.
// Sem cabeçalho a requisição segue anônima; quem exige login é o extrator.
// Um token presente mas inválido é sempre rejeitado.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match request.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => {
            let user = app_state.auth_service.validate_token(bearer.token()).await?;
            let principal = app_state.access_policy.resolve(user).await?;

            // Insere o principal nos "extensions" da requisição
            request.extensions_mut().insert(principal);
        }
        None if request.headers().contains_key(AUTHORIZATION) => {
            return Err(AppError::unauthorized("Invalid token"));
        }
        None => {}
    }

    Ok(next.run(request).await)
}

/// Extrator para rotas autenticadas: 401 quando não há principal.
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extrator para as visões públicas (lista de médicos, agenda).
pub struct MaybePrincipal(pub Option<Principal>);

impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
