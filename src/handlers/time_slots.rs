// src/handlers/time_slots.rs

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
        response::{ApiResponse, MessageResponse},
    },
    config::AppState,
    middleware::auth::{CurrentPrincipal, MaybePrincipal},
    models::time_slot::{BulkCreateResponse, BulkCreateSlotsPayload, CreateSlotPayload, TimeSlot},
};

// POST /api/time-slots
#[utoipa::path(
    post,
    path = "/api/time-slots",
    tag = "Time Slots",
    request_body = CreateSlotPayload,
    responses(
        (status = 201, description = "Horário criado", body = ApiResponse<TimeSlot>),
        (status = 400, description = "Horário inválido"),
        (status = 403, description = "Sem acesso à agenda do médico"),
        (status = 409, description = "Já existe um horário começando neste momento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_slot(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateSlotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slot = app_state.slot_service.create(&principal, payload).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(slot))))
}

// POST /api/time-slots/bulk
#[utoipa::path(
    post,
    path = "/api/time-slots/bulk",
    tag = "Time Slots",
    request_body = BulkCreateSlotsPayload,
    responses(
        (status = 201, description = "Quantidade de horários inseridos", body = BulkCreateResponse),
        (status = 400, description = "Intervalo inválido"),
        (status = 403, description = "Sem acesso à agenda do médico")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_create_slots(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<BulkCreateSlotsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.slot_service.bulk_create(&principal, payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/time-slots/doctor/{doctorId}
#[utoipa::path(
    get,
    path = "/api/time-slots/doctor/{doctorId}",
    tag = "Time Slots",
    params(("doctorId" = Uuid, Path, description = "ID do médico")),
    responses(
        (status = 200, description = "Agenda semanal do médico", body = ApiResponse<Vec<TimeSlot>>),
        (status = 403, description = "Profissional sem acesso a esta agenda")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn list_doctor_slots(
    State(app_state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(doctor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let slots = app_state
        .slot_service
        .list_for_doctor(doctor_id, principal.as_ref())
        .await?;

    Ok(Json(ApiResponse::ok(slots)))
}

// DELETE /api/time-slots/{id}
#[utoipa::path(
    delete,
    path = "/api/time-slots/{id}",
    tag = "Time Slots",
    params(("id" = Uuid, Path, description = "ID do horário")),
    responses(
        (status = 200, description = "Horário removido", body = MessageResponse),
        (status = 403, description = "Sem acesso à agenda do médico"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_slot(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.slot_service.delete(&principal, id).await?;

    Ok(Json(MessageResponse::ok("Time slot deleted successfully")))
}
