// src/models/doctor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::auth::UserSummary;

// Mapeia o CREATE TYPE doctor_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "doctor_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DoctorType {
    Therapist,
    Intern,
}

// Perfil de profissional (terapeuta ou estagiário), 1:1 com um usuário
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub doctor_type: DoctorType,
    #[schema(example = "Clinical Psychology")]
    pub specialization: Option<String>,
    #[schema(example = "PSY-12345")]
    pub license_number: Option<String>,
    /// Terapeuta supervisor (somente estagiários).
    pub assigned_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Versão resumida usada nas relações (supervisor, estagiários).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorBrief {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub doctor_type: DoctorType,
    pub specialization: Option<String>,
    pub user: Option<UserSummary>,
}

// Resposta completa: médico + usuário + supervisor + estagiários
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDetail {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub user: Option<UserSummary>,
    pub assigned_to: Option<DoctorBrief>,
    pub interns: Vec<DoctorBrief>,
}

#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub user_id: Uuid,
    pub doctor_type: DoctorType,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub assigned_to_id: Option<Uuid>,
}

/// Patch livre: `None` mantém o valor atual.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPatch {
    #[serde(rename = "type")]
    pub doctor_type: Option<DoctorType>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorPayload {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub doctor_type: DoctorType,
    #[schema(example = "Clinical Psychology")]
    pub specialization: Option<String>,
    #[schema(example = "PSY-12345")]
    pub license_number: Option<String>,
    pub assigned_to_id: Option<Uuid>,
}

impl From<CreateDoctorPayload> for NewDoctor {
    fn from(payload: CreateDoctorPayload) -> Self {
        Self {
            user_id: payload.user_id,
            doctor_type: payload.doctor_type,
            specialization: payload.specialization,
            license_number: payload.license_number,
            assigned_to_id: payload.assigned_to_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignInternPayload {
    pub intern_id: Uuid,
    pub therapist_id: Uuid,
}
