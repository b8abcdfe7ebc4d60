// src/models/time_slot.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

/// Janela semanal recorrente de atendimento. É um molde, não uma data.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    /// 0 = domingo ... 6 = sábado
    #[schema(example = 1)]
    pub day_of_week: i16,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "10:00")]
    pub end_time: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Horário já normalizado, pronto para o repositório
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl NewSlot {
    /// Chave de idempotência da geração em massa.
    pub fn key(&self) -> (Uuid, i16, &str) {
        (self.doctor_id, self.day_of_week, self.start_time.as_str())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotPayload {
    pub doctor_id: Uuid,

    #[validate(range(min = 0, max = 6, message = "dayOfWeek deve estar entre 0 e 6."))]
    #[schema(example = 1)]
    pub day_of_week: i16,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "09:00")]
    pub start_time: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "10:00")]
    pub end_time: String,

    #[serde(default = "default_available")]
    #[schema(example = true)]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateSlotsPayload {
    pub doctor_id: Uuid,

    #[validate(range(min = 0, max = 6, message = "dayOfWeek deve estar entre 0 e 6."))]
    #[schema(example = 1)]
    pub day_of_week: i16,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "09:00")]
    pub start_range: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "12:00")]
    pub end_range: String,

    #[validate(range(min = 1, message = "durationMinutes deve ser no mínimo 1."))]
    #[schema(example = 60)]
    pub duration_minutes: u16,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkCreateResponse {
    pub success: bool,
    /// Quantos horários foram de fato inseridos (duplicados são ignorados).
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
