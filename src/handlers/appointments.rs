// src/handlers/appointments.rs

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
    models::appointment::{AppointmentDetail, AppointmentPatch, CreateAppointmentPayload},
};

// POST /api/appointments
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentPayload,
    responses(
        (status = 201, description = "Agendamento criado e horário reservado", body = ApiResponse<AppointmentDetail>),
        (status = 404, description = "Cliente, médico ou horário não encontrado"),
        (status = 409, description = "Horário já reservado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let appointment = app_state
        .appointment_service
        .create(&principal, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(appointment))))
}

// GET /api/appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "Appointments",
    responses(
        (status = 200, description = "Agendamentos visíveis ao chamador, mais recentes primeiro", body = ApiResponse<Page<AppointmentDetail>>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let appointments = app_state.appointment_service.list(&principal).await?;

    Ok(Json(ApiResponse::ok(Page::full(appointments))))
}

// GET /api/appointments/{id}
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento", body = ApiResponse<AppointmentDetail>),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = app_state.appointment_service.get(id, &principal).await?;

    Ok(Json(ApiResponse::ok(appointment)))
}

// PATCH /api/appointments/{id}
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    request_body = AppointmentPatch,
    responses(
        (status = 200, description = "Agendamento atualizado", body = ApiResponse<AppointmentDetail>),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Novo horário já reservado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;

    let appointment = app_state
        .appointment_service
        .update(&principal, id, patch)
        .await?;

    Ok(Json(ApiResponse::ok(appointment)))
}

// DELETE /api/appointments/{id}
#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento removido e horário liberado", body = MessageResponse),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_appointment(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.appointment_service.delete(&principal, id).await?;

    Ok(Json(MessageResponse::ok("Appointment deleted successfully")))
}
