// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        response::{ApiResponse, MessageResponse, Page},
    },
    config::AppState,
    middleware::auth::CurrentPrincipal,
    models::customer::{AssignCustomerPayload, CreateCustomerPayload, CustomerDetail, CustomerPatch},
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = ApiResponse<CustomerDetail>),
        (status = 404, description = "Usuário ou estagiário não encontrado"),
        (status = 409, description = "Usuário já possui perfil de cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .create(&principal, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(customer))))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "Clientes visíveis ao chamador", body = ApiResponse<Page<CustomerDetail>>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list(&principal).await?;

    Ok(Json(ApiResponse::ok(Page::full(customers))))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = ApiResponse<CustomerDetail>),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.get(id, &principal).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

// PATCH /api/customers/{id}
#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPatch,
    responses(
        (status = 200, description = "Cliente atualizado", body = ApiResponse<CustomerDetail>),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<CustomerPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;

    let customer = app_state.customer_service.update(&principal, id, patch).await?;

    Ok(Json(ApiResponse::ok(customer)))
}

// POST /api/customers/assign-intern
#[utoipa::path(
    post,
    path = "/api/customers/assign-intern",
    tag = "Customers",
    request_body = AssignCustomerPayload,
    responses(
        (status = 200, description = "Cliente atribuído ao estagiário", body = ApiResponse<CustomerDetail>),
        (status = 400, description = "O médico escolhido não é estagiário"),
        (status = 404, description = "Cliente ou estagiário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_to_intern(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<AssignCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .customer_service
        .assign_to_intern(&principal, payload.customer_id, payload.intern_id)
        .await?;

    Ok(Json(ApiResponse::ok(customer)))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente removido", body = MessageResponse),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.customer_service.delete(&principal, id).await?;

    Ok(Json(MessageResponse::ok("Customer deleted successfully")))
}
