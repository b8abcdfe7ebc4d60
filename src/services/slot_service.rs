// src/services/slot_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        clock::{format_minutes, ClockTime},
        error::AppError,
    },
    db::{DoctorStore, SlotStore},
    models::{
        access::Principal,
        auth::Role,
        time_slot::{BulkCreateResponse, BulkCreateSlotsPayload, CreateSlotPayload, NewSlot, TimeSlot},
    },
};

// Quem administra a agenda
const SCHEDULERS: &[Role] = &[Role::Admin, Role::Therapist, Role::Intern];

/// Gera horários consecutivos de `duration` minutos a partir de `start`,
/// parando quando o próximo ultrapassaria `end`.
pub fn generate_slots(doctor_id: Uuid, day_of_week: i16, start: ClockTime, end: ClockTime, duration: u16) -> Vec<NewSlot> {
    let limit = u32::from(end.minutes());
    let step = u32::from(duration.max(1));
    let mut cursor = u32::from(start.minutes());
    let mut slots = Vec::new();

    while cursor + step <= limit {
        slots.push(NewSlot {
            doctor_id,
            day_of_week,
            start_time: format_minutes(cursor),
            end_time: format_minutes(cursor + step),
            is_available: true,
        });
        cursor += step;
    }

    slots
}

#[derive(Clone)]
pub struct SlotService {
    slots: Arc<dyn SlotStore>,
    doctors: Arc<dyn DoctorStore>,
}

impl SlotService {
    pub fn new(slots: Arc<dyn SlotStore>, doctors: Arc<dyn DoctorStore>) -> Self {
        Self { slots, doctors }
    }

    pub async fn create(&self, principal: &Principal, payload: CreateSlotPayload) -> Result<TimeSlot, AppError> {
        self.check_doctor(principal, payload.doctor_id).await?;

        let (start, end) = parse_range(&payload.start_time, &payload.end_time)?;
        let slot = self
            .slots
            .create(NewSlot {
                doctor_id: payload.doctor_id,
                day_of_week: payload.day_of_week,
                start_time: start.to_string(),
                end_time: end.to_string(),
                is_available: payload.is_available,
            })
            .await?;

        Ok(slot)
    }

    /// `count` é quantos horários foram realmente inseridos.
    pub async fn bulk_create(
        &self,
        principal: &Principal,
        payload: BulkCreateSlotsPayload,
    ) -> Result<BulkCreateResponse, AppError> {
        self.check_doctor(principal, payload.doctor_id).await?;

        let (start, end) = parse_range(&payload.start_range, &payload.end_range)?;
        let generated = generate_slots(payload.doctor_id, payload.day_of_week, start, end, payload.duration_minutes);
        if generated.is_empty() {
            return Ok(BulkCreateResponse {
                success: true,
                count: 0,
                message: Some("No slots could be generated in the given range".to_string()),
            });
        }

        let inserted = self.slots.insert_skip_duplicates(&generated).await?;
        tracing::info!(
            "🗓️ {} de {} horários gerados para o médico {} (dia {})",
            inserted,
            generated.len(),
            payload.doctor_id,
            payload.day_of_week
        );

        Ok(BulkCreateResponse {
            success: true,
            count: inserted,
            message: None,
        })
    }

    /// Anônimos, clientes e admins veem a agenda pública; profissionais só a
    /// que alcançam.
    pub async fn list_for_doctor(&self, doctor_id: Uuid, principal: Option<&Principal>) -> Result<Vec<TimeSlot>, AppError> {
        let staff = principal.filter(|p| matches!(p, Principal::Therapist { .. } | Principal::Intern { .. }));
        if let Some(principal) = staff {
            if !principal.visibility().allows_doctor(doctor_id) {
                return Err(AppError::forbidden("You do not have access to this doctor's schedule"));
            }
        }

        self.slots.list_for_doctor(doctor_id).await
    }

    // Não verifica agendamentos que apontam para o horário
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require_any(SCHEDULERS)?;

        let slot = self
            .slots
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Time slot not found"))?;
        self.check_doctor(principal, slot.doctor_id).await?;

        if !self.slots.delete(id).await? {
            return Err(AppError::not_found("Time slot not found"));
        }
        tracing::info!("🗑️ Horário {} removido", id);
        Ok(())
    }

    async fn check_doctor(&self, principal: &Principal, doctor_id: Uuid) -> Result<(), AppError> {
        principal.require_any(SCHEDULERS)?;

        if self.doctors.find_by_id(doctor_id).await?.is_none() {
            return Err(AppError::not_found("Doctor not found"));
        }
        if !principal.visibility().allows_doctor(doctor_id) {
            tracing::warn!("🚫 {} sem acesso à agenda de {}", principal.user().email, doctor_id);
            return Err(AppError::forbidden("You do not have access to this doctor's schedule"));
        }
        Ok(())
    }
}

fn parse_range(start: &str, end: &str) -> Result<(ClockTime, ClockTime), AppError> {
    let start: ClockTime = start.parse()?;
    let end: ClockTime = end.parse()?;
    if start >= end {
        return Err(AppError::bad_request("Start time must be before end time"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    fn at(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn bulk(doctor_id: Uuid, start: &str, end: &str, duration: u16) -> BulkCreateSlotsPayload {
        BulkCreateSlotsPayload {
            doctor_id,
            day_of_week: 1,
            start_range: start.to_string(),
            end_range: end.to_string(),
            duration_minutes: duration,
        }
    }

    #[test]
    fn generation_stops_before_overflowing_the_range() {
        let doctor = Uuid::new_v4();
        let slots = generate_slots(doctor, 1, at("09:00"), at("12:00"), 60);
        let ranges: Vec<(&str, &str)> = slots
            .iter()
            .map(|s| (s.start_time.as_str(), s.end_time.as_str()))
            .collect();
        assert_eq!(ranges, vec![("09:00", "10:00"), ("10:00", "11:00"), ("11:00", "12:00")]);

        let partial = generate_slots(doctor, 1, at("09:00"), at("10:40"), 45);
        assert_eq!(partial.len(), 2);
        assert_eq!(partial[1].end_time, "10:30");

        assert!(generate_slots(doctor, 1, at("09:00"), at("09:30"), 60).is_empty());
    }

    #[tokio::test]
    async fn bulk_creation_is_idempotent() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let service = &fx.state.slot_service;

        let first = service
            .bulk_create(&therapist, bulk(therapist.doctor_id(), "09:00", "12:00", 60))
            .await
            .unwrap();
        assert_eq!(first.count, 3);

        let again = service
            .bulk_create(&therapist, bulk(therapist.doctor_id(), "09:00", "12:00", 60))
            .await
            .unwrap();
        assert_eq!(again.count, 0);
        assert!(again.message.is_none());

        let too_short = service
            .bulk_create(&therapist, bulk(therapist.doctor_id(), "09:00", "09:30", 60))
            .await
            .unwrap();
        assert_eq!(too_short.count, 0);
        assert!(too_short.message.is_some());

        let listed = service.list_for_doctor(therapist.doctor_id(), None).await.unwrap();
        let starts: Vec<&str> = listed.iter().map(|s| s.start_time.as_str()).collect();
        assert_eq!(starts, vec!["09:00", "10:00", "11:00"]);
    }

    #[tokio::test]
    async fn inverted_range_persists_nothing() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;

        let err = fx
            .state
            .slot_service
            .bulk_create(&therapist, bulk(therapist.doctor_id(), "10:00", "09:00", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let listed = fx
            .state
            .slot_service
            .list_for_doctor(therapist.doctor_id(), None)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn intern_cannot_touch_someone_elses_schedule() {
        let fx = Fixture::new().await;
        let intern = fx.intern("i@clinic.test").await;
        let other = fx.intern("other@clinic.test").await;

        let err = fx
            .state
            .slot_service
            .bulk_create(&intern, bulk(other.doctor_id(), "09:00", "12:00", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let customer = fx.customer("c@clinic.test").await;
        let err = fx
            .state
            .slot_service
            .bulk_create(&customer, bulk(other.doctor_id(), "09:00", "12:00", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn malformed_time_is_a_bad_request() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let payload = CreateSlotPayload {
            doctor_id: therapist.doctor_id(),
            day_of_week: 2,
            start_time: "9h".to_string(),
            end_time: "10:00".to_string(),
            is_available: true,
        };

        let err = fx.state.slot_service.create(&therapist, payload).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
