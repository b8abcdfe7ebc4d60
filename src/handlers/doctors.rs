// src/handlers/doctors.rs

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
    middleware::auth::{CurrentPrincipal, MaybePrincipal},
    models::doctor::{AssignInternPayload, CreateDoctorPayload, DoctorDetail, DoctorPatch},
};

// POST /api/doctors
#[utoipa::path(
    post,
    path = "/api/doctors",
    tag = "Doctors",
    request_body = CreateDoctorPayload,
    responses(
        (status = 201, description = "Médico criado", body = ApiResponse<DoctorDetail>),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Usuário já possui perfil de médico")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_doctor(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<CreateDoctorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let doctor = app_state
        .doctor_service
        .create(&principal, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(doctor))))
}

// GET /api/doctors
#[utoipa::path(
    get,
    path = "/api/doctors",
    tag = "Doctors",
    responses(
        (status = 200, description = "Médicos visíveis ao chamador (todos, se anônimo)", body = ApiResponse<Page<DoctorDetail>>)
    ),
    security((), ("api_jwt" = []))
)]
pub async fn list_doctors(
    State(app_state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<impl IntoResponse, AppError> {
    let doctors = app_state.doctor_service.list(principal.as_ref()).await?;

    Ok(Json(ApiResponse::ok(Page::full(doctors))))
}

// GET /api/doctors/therapists
#[utoipa::path(
    get,
    path = "/api/doctors/therapists",
    tag = "Doctors",
    responses(
        (status = 200, description = "Terapeutas com seus estagiários", body = ApiResponse<Vec<DoctorDetail>>),
        (status = 403, description = "Somente admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_therapists(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let therapists = app_state.doctor_service.list_therapists(&principal).await?;

    Ok(Json(ApiResponse::ok(therapists)))
}

// GET /api/doctors/{id}
#[utoipa::path(
    get,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = Uuid, Path, description = "ID do médico")),
    responses(
        (status = 200, description = "Médico", body = ApiResponse<DoctorDetail>),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn get_doctor(
    State(app_state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let doctor = app_state.doctor_service.get(id, principal.as_ref()).await?;

    Ok(Json(ApiResponse::ok(doctor)))
}

// PATCH /api/doctors/{id}
#[utoipa::path(
    patch,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = Uuid, Path, description = "ID do médico")),
    request_body = DoctorPatch,
    responses(
        (status = 200, description = "Médico atualizado", body = ApiResponse<DoctorDetail>),
        (status = 400, description = "Terapeuta não pode ter supervisor"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_doctor(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(patch): Json<DoctorPatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;

    let doctor = app_state.doctor_service.update(&principal, id, patch).await?;

    Ok(Json(ApiResponse::ok(doctor)))
}

// POST /api/doctors/assign-intern
#[utoipa::path(
    post,
    path = "/api/doctors/assign-intern",
    tag = "Doctors",
    request_body = AssignInternPayload,
    responses(
        (status = 200, description = "Estagiário atribuído ao terapeuta", body = ApiResponse<DoctorDetail>),
        (status = 400, description = "Tipos de médico incompatíveis"),
        (status = 404, description = "Estagiário ou terapeuta não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_intern(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(payload): Json<AssignInternPayload>,
) -> Result<impl IntoResponse, AppError> {
    let intern = app_state
        .doctor_service
        .assign_intern(&principal, payload.intern_id, payload.therapist_id)
        .await?;

    Ok(Json(ApiResponse::ok(intern)))
}

// DELETE /api/doctors/{id}
#[utoipa::path(
    delete,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = Uuid, Path, description = "ID do médico")),
    responses(
        (status = 200, description = "Médico removido", body = MessageResponse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_doctor(
    State(app_state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.doctor_service.delete(&principal, id).await?;

    Ok(Json(MessageResponse::ok("Doctor deleted successfully")))
}
