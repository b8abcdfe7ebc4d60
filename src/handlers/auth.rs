// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::auth::{AuthResponse, LoginPayload, SignupPayload},
};

// POST /api/auth/signup
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Usuário criado", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.signup(payload).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Credenciais inválidas ou conta inativa")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::ok(response)))
}

// GET /api/auth/validate
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    tag = "Auth",
    responses(
        (status = 200, description = "Token válido", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Token inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate(
    CurrentPrincipal(principal): CurrentPrincipal,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<impl IntoResponse, AppError> {
    let user = principal.user();

    Ok(Json(ApiResponse::ok(AuthResponse {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        token: bearer.token().to_string(),
    })))
}
