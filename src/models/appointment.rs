// src/models/appointment.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{auth::UserSummary, doctor::DoctorBrief, time_slot::TimeSlot};

// Mapeia o CREATE TYPE appointment_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    #[sqlx(rename = "no-show")]
    #[serde(rename = "no-show")]
    NoShow,
}

impl AppointmentStatus {
    /// Um agendamento não cancelado ocupa o seu horário.
    pub fn holds_slot(self) -> bool {
        self != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub doctor_id: Uuid,
    pub time_slot_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2024-12-25")]
    pub date: NaiveDate,
    pub status: AppointmentStatus,
    /// Usuário que criou o agendamento.
    pub scheduled_by: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBrief {
    pub id: Uuid,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub customer: Option<CustomerBrief>,
    pub doctor: Option<DoctorBrief>,
    pub time_slot: Option<TimeSlot>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub customer_id: Uuid,
    pub doctor_id: Uuid,
    pub time_slot_id: Uuid,
    pub date: NaiveDate,
    pub status: AppointmentStatus,
    pub scheduled_by: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentPayload {
    pub customer_id: Uuid,
    pub doctor_id: Uuid,
    pub time_slot_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2024-12-25")]
    pub date: NaiveDate,
    pub status: Option<AppointmentStatus>,
    #[schema(example = "Initial consultation")]
    pub notes: Option<String>,
}

/// Patch livre: `None` mantém o valor atual. Não há máquina de estados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    pub time_slot_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Efeito de um patch sobre os horários: qual liberar e qual ocupar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotTransition {
    pub release: Option<Uuid>,
    pub take: Option<Uuid>,
}

impl SlotTransition {
    pub fn for_update(current: &Appointment, patch: &AppointmentPatch) -> Self {
        let next_slot = patch.time_slot_id.unwrap_or(current.time_slot_id);
        let next_holds = patch.status.unwrap_or(current.status).holds_slot();
        let slot_changed = next_slot != current.time_slot_id;

        let release = (current.holds_slot() && (slot_changed || !next_holds))
            .then_some(current.time_slot_id);
        let take = (next_holds && (slot_changed || !current.holds_slot())).then_some(next_slot);

        Self { release, take }
    }

    pub fn for_removal(current: &Appointment) -> Self {
        Self {
            release: current.holds_slot().then_some(current.time_slot_id),
            take: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(slot: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            time_slot_id: slot,
            date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            status: AppointmentStatus::Scheduled,
            scheduled_by: Uuid::new_v4(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn moving_to_another_slot_swaps_them() {
        let (old, new) = (Uuid::new_v4(), Uuid::new_v4());
        let patch = AppointmentPatch {
            time_slot_id: Some(new),
            ..Default::default()
        };
        let transition = SlotTransition::for_update(&scheduled(old), &patch);
        assert_eq!(transition.release, Some(old));
        assert_eq!(transition.take, Some(new));
    }

    #[test]
    fn same_slot_and_notes_only_touch_nothing() {
        let slot = Uuid::new_v4();
        let patch = AppointmentPatch {
            time_slot_id: Some(slot),
            notes: Some("follow-up".into()),
            ..Default::default()
        };
        assert_eq!(
            SlotTransition::for_update(&scheduled(slot), &patch),
            SlotTransition::default()
        );
    }

    #[test]
    fn cancelling_releases_and_reviving_retakes() {
        let slot = Uuid::new_v4();
        let cancel = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        let mut appointment = scheduled(slot);
        let transition = SlotTransition::for_update(&appointment, &cancel);
        assert_eq!(transition.release, Some(slot));
        assert_eq!(transition.take, None);

        appointment.status = AppointmentStatus::Cancelled;
        let revive = AppointmentPatch {
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        };
        let transition = SlotTransition::for_update(&appointment, &revive);
        assert_eq!(transition.release, None);
        assert_eq!(transition.take, Some(slot));
        assert_eq!(SlotTransition::for_removal(&appointment).release, None);
    }

    #[test]
    fn no_show_uses_the_hyphenated_wire_name() {
        let json = serde_json::to_string(&AppointmentStatus::NoShow).unwrap();
        assert_eq!(json, "\"no-show\"");

        let parsed: AppointmentStatus = serde_json::from_str("\"no-show\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::NoShow);
    }

    #[test]
    fn only_cancelled_releases_the_slot() {
        assert!(AppointmentStatus::Scheduled.holds_slot());
        assert!(AppointmentStatus::Completed.holds_slot());
        assert!(AppointmentStatus::NoShow.holds_slot());
        assert!(!AppointmentStatus::Cancelled.holds_slot());
    }
}
