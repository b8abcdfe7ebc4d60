// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{auth::UserSummary, doctor::DoctorBrief};

// Perfil de cliente (paciente), 1:1 com um usuário de papel customer
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Estagiário responsável.
    pub assigned_intern_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-01-01")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub user: Option<UserSummary>,
    pub assigned_intern: Option<DoctorBrief>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub user_id: Uuid,
    pub assigned_intern_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    pub user_id: Uuid,
    pub assigned_intern_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-01-01")]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "123 Main St, City, State")]
    pub address: Option<String>,
    #[schema(example = "+1234567890")]
    pub emergency_contact: Option<String>,
    #[schema(example = "Patient notes here")]
    pub notes: Option<String>,
}

impl From<CreateCustomerPayload> for NewCustomer {
    fn from(payload: CreateCustomerPayload) -> Self {
        Self {
            user_id: payload.user_id,
            assigned_intern_id: payload.assigned_intern_id,
            date_of_birth: payload.date_of_birth,
            address: payload.address,
            emergency_contact: payload.emergency_contact,
            notes: payload.notes,
        }
    }
}

/// Patch livre: `None` mantém o valor atual.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub assigned_intern_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignCustomerPayload {
    pub customer_id: Uuid,
    pub intern_id: Uuid,
}
