// src/services/appointment_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AppointmentStore, CustomerStore, DoctorStore, SlotStore},
    models::{
        access::Principal,
        appointment::{
            Appointment, AppointmentDetail, AppointmentPatch, AppointmentStatus, CreateAppointmentPayload,
            NewAppointment,
        },
        auth::Role,
    },
    services::detail::DetailLoader,
};

// Quem pode marcar, remarcar e desmarcar
const SCHEDULERS: &[Role] = &[Role::Admin, Role::Therapist, Role::Intern];

#[derive(Clone)]
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentStore>,
    customers: Arc<dyn CustomerStore>,
    doctors: Arc<dyn DoctorStore>,
    slots: Arc<dyn SlotStore>,
    details: DetailLoader,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        customers: Arc<dyn CustomerStore>,
        doctors: Arc<dyn DoctorStore>,
        slots: Arc<dyn SlotStore>,
        details: DetailLoader,
    ) -> Self {
        Self {
            appointments,
            customers,
            doctors,
            slots,
            details,
        }
    }

    /// Valida as referências e reserva o horário numa única operação atômica.
    pub async fn create(
        &self,
        principal: &Principal,
        payload: CreateAppointmentPayload,
    ) -> Result<AppointmentDetail, AppError> {
        principal.require_any(SCHEDULERS)?;

        if self.customers.find_by_id(payload.customer_id).await?.is_none() {
            return Err(AppError::not_found("Customer not found"));
        }
        if self.doctors.find_by_id(payload.doctor_id).await?.is_none() {
            return Err(AppError::not_found("Doctor not found"));
        }
        if self.slots.find_by_id(payload.time_slot_id).await?.is_none() {
            return Err(AppError::not_found("Time slot not found"));
        }

        // O repositório devolve Conflict se o horário já foi ocupado
        let appointment = self
            .appointments
            .book(NewAppointment {
                customer_id: payload.customer_id,
                doctor_id: payload.doctor_id,
                time_slot_id: payload.time_slot_id,
                date: payload.date,
                status: payload.status.unwrap_or(AppointmentStatus::Scheduled),
                scheduled_by: principal.user().id,
                notes: payload.notes,
            })
            .await?;

        tracing::info!(
            "📅 Agendamento {} criado por {} (horário {}, {})",
            appointment.id,
            principal.user().email,
            appointment.time_slot_id,
            appointment.date
        );

        self.details.appointment(appointment).await
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<AppointmentDetail>, AppError> {
        let appointments = self.appointments.list(&principal.visibility()).await?;
        self.details.appointments(appointments).await
    }

    pub async fn get(&self, id: Uuid, principal: &Principal) -> Result<AppointmentDetail, AppError> {
        let appointment = self.find_visible(id, principal).await?;
        self.details.appointment(appointment).await
    }

    /// Patch livre. Trocar de horário ou de/para `cancelled` move a ocupação
    /// dos horários na mesma transação.
    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<AppointmentDetail, AppError> {
        principal.require_any(SCHEDULERS)?;
        let current = self.find_visible(id, principal).await?;

        if let Some(slot_id) = patch.time_slot_id.filter(|slot_id| *slot_id != current.time_slot_id) {
            if self.slots.find_by_id(slot_id).await?.is_none() {
                return Err(AppError::not_found("Time slot not found"));
            }
        }

        let appointment = self
            .appointments
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        if appointment.time_slot_id != current.time_slot_id {
            tracing::info!(
                "🔁 Agendamento {} remarcado: {} -> {}",
                id,
                current.time_slot_id,
                appointment.time_slot_id
            );
        }

        self.details.appointment(appointment).await
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require_any(SCHEDULERS)?;
        self.find_visible(id, principal).await?;

        let removed = self
            .appointments
            .cancel(id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        tracing::info!("❌ Agendamento {} removido, horário {} liberado", id, removed.time_slot_id);
        Ok(())
    }

    async fn find_visible(&self, id: Uuid, principal: &Principal) -> Result<Appointment, AppError> {
        let appointment = self
            .appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        if !principal.visibility().allows_appointment(&appointment) {
            tracing::warn!("🚫 {} sem acesso ao agendamento {}", principal.user().email, id);
            return Err(AppError::forbidden("You do not have access to this appointment"));
        }
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::{
        models::{access::Principal, time_slot::TimeSlot},
        services::testing::Fixture,
    };

    struct Clinic {
        fx: Fixture,
        admin: Principal,
        therapist: Principal,
        intern: Principal,
        customer: Principal,
        slots: Vec<TimeSlot>,
    }

    async fn clinic() -> Clinic {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.supervised_intern("i@clinic.test", &therapist).await;
        let therapist = fx.refresh(&therapist).await;
        let customer = fx.customer("c@clinic.test").await;

        fx.stores
            .slots
            .insert_skip_duplicates(&crate::services::slot_service::generate_slots(
                intern.doctor_id(),
                1,
                "09:00".parse().unwrap(),
                "11:00".parse().unwrap(),
                60,
            ))
            .await
            .unwrap();
        let slots = fx.stores.slots.list_for_doctor(intern.doctor_id()).await.unwrap();

        Clinic {
            fx,
            admin,
            therapist,
            intern,
            customer,
            slots,
        }
    }

    fn booking(clinic: &Clinic, slot: &TimeSlot) -> CreateAppointmentPayload {
        CreateAppointmentPayload {
            customer_id: clinic.customer.customer_id(),
            doctor_id: clinic.intern.doctor_id(),
            time_slot_id: slot.id,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            status: None,
            notes: Some("Initial consultation".to_string()),
        }
    }

    async fn availability(clinic: &Clinic) -> Vec<bool> {
        clinic
            .fx
            .stores
            .slots
            .list_for_doctor(clinic.intern.doctor_id())
            .await
            .unwrap()
            .iter()
            .map(|s| s.is_available)
            .collect()
    }

    #[tokio::test]
    async fn booking_consumes_and_deleting_frees_the_slot() {
        let clinic = clinic().await;
        let service = &clinic.fx.state.appointment_service;

        let booked = service
            .create(&clinic.intern, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap();
        assert_eq!(booked.appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(booked.appointment.scheduled_by, clinic.intern.user().id);
        assert_eq!(availability(&clinic).await, vec![false, true]);

        let err = service
            .create(&clinic.admin, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        service.delete(&clinic.intern, booked.appointment.id).await.unwrap();
        assert_eq!(availability(&clinic).await, vec![true, true]);
    }

    #[tokio::test]
    async fn rescheduling_moves_the_reservation() {
        let clinic = clinic().await;
        let service = &clinic.fx.state.appointment_service;
        let booked = service
            .create(&clinic.intern, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap();

        let patch = AppointmentPatch {
            time_slot_id: Some(clinic.slots[1].id),
            ..Default::default()
        };
        let moved = service
            .update(&clinic.intern, booked.appointment.id, patch)
            .await
            .unwrap();
        assert_eq!(moved.appointment.time_slot_id, clinic.slots[1].id);
        assert_eq!(availability(&clinic).await, vec![true, false]);
    }

    #[tokio::test]
    async fn cancelling_by_status_frees_the_slot() {
        let clinic = clinic().await;
        let service = &clinic.fx.state.appointment_service;
        let booked = service
            .create(&clinic.intern, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap();

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        service
            .update(&clinic.admin, booked.appointment.id, patch)
            .await
            .unwrap();
        assert_eq!(availability(&clinic).await, vec![true, true]);
    }

    #[tokio::test]
    async fn therapist_sees_appointments_of_own_intern() {
        let clinic = clinic().await;
        let service = &clinic.fx.state.appointment_service;
        let booked = service
            .create(&clinic.intern, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap();

        let seen = service.list(&clinic.therapist).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].appointment.id, booked.appointment.id);
        assert_eq!(seen[0].time_slot.as_ref().map(|s| s.id), Some(clinic.slots[0].id));

        let stranger = clinic.fx.therapist("t2@clinic.test").await;
        assert!(service.list(&stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn customer_cannot_read_someone_elses_appointment() {
        let clinic = clinic().await;
        let service = &clinic.fx.state.appointment_service;
        let booked = service
            .create(&clinic.intern, booking(&clinic, &clinic.slots[0]))
            .await
            .unwrap();

        let own = service.get(booked.appointment.id, &clinic.customer).await.unwrap();
        assert_eq!(own.customer.as_ref().map(|c| c.id), Some(clinic.customer.customer_id()));

        let other = clinic.fx.customer("y@clinic.test").await;
        let err = service.get(booked.appointment.id, &other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .create(&clinic.customer, booking(&clinic, &clinic.slots[1]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        let clinic = clinic().await;
        let mut payload = booking(&clinic, &clinic.slots[0]);
        payload.time_slot_id = Uuid::new_v4();

        let err = clinic
            .fx
            .state
            .appointment_service
            .create(&clinic.admin, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(availability(&clinic).await, vec![true, true]);
    }
}
