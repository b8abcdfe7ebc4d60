// src/db/appointment_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::time_slot_repo::{release_slot, take_slot},
    models::{
        access::Visibility,
        appointment::{Appointment, AppointmentPatch, NewAppointment, SlotTransition},
    },
};

const APPOINTMENT_COLUMNS: &str = "id, customer_id, doctor_id, time_slot_id, date, status, scheduled_by, notes, created_at, updated_at";

/// Agendamentos. As operações que mexem em horários são atômicas: o
/// agendamento e a flag `is_available` mudam juntos ou não mudam.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;

    /// Data mais recente primeiro.
    async fn list(&self, visibility: &Visibility) -> Result<Vec<Appointment>, AppError>;

    /// Ocupa o horário (se o status ocupa) e grava o agendamento.
    /// `Conflict` se o horário já estiver ocupado.
    async fn book(&self, new_appointment: NewAppointment) -> Result<Appointment, AppError>;

    /// Aplica o patch movendo a ocupação de horários conforme `SlotTransition`.
    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> Result<Option<Appointment>, AppError>;

    /// Libera o horário e remove o agendamento.
    async fn cancel(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;
}

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(appointment)
    }

    async fn apply(conn: &mut PgConnection, transition: SlotTransition) -> Result<(), AppError> {
        // Libera antes de ocupar
        if let Some(slot_id) = transition.release {
            release_slot(conn, slot_id).await?;
        }
        if let Some(slot_id) = transition.take {
            take_slot(conn, slot_id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for AppointmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Appointment>, AppError> {
        let appointments = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Appointment>(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Practitioners(ids) => {
                sqlx::query_as::<_, Appointment>(&format!(
                    r#"
                    SELECT {APPOINTMENT_COLUMNS} FROM appointments
                    WHERE doctor_id = ANY($1)
                    ORDER BY date DESC
                    "#
                ))
                .bind(ids.as_slice())
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Customer(id) => {
                sqlx::query_as::<_, Appointment>(&format!(
                    r#"
                    SELECT {APPOINTMENT_COLUMNS} FROM appointments
                    WHERE customer_id = $1
                    ORDER BY date DESC
                    "#
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Nothing => Vec::new(),
        };

        Ok(appointments)
    }

    async fn book(&self, new_appointment: NewAppointment) -> Result<Appointment, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        if new_appointment.status.holds_slot() {
            take_slot(&mut *tx, new_appointment.time_slot_id).await?;
        }

        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            INSERT INTO appointments (
                customer_id, doctor_id, time_slot_id, date, status, scheduled_by, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(new_appointment.customer_id)
        .bind(new_appointment.doctor_id)
        .bind(new_appointment.time_slot_id)
        .bind(new_appointment.date)
        .bind(new_appointment.status)
        .bind(new_appointment.scheduled_by)
        .bind(&new_appointment.notes)
        .fetch_one(&mut *tx)
        .await?;

        // Se algo falhar acima, o drop do tx faz rollback automático
        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(appointment)
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> Result<Option<Appointment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = Self::lock(&mut *tx, id).await? else {
            return Ok(None);
        };

        Self::apply(&mut *tx, SlotTransition::for_update(&current, &patch)).await?;

        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            UPDATE appointments SET
                time_slot_id = COALESCE($2, time_slot_id),
                date = COALESCE($3, date),
                status = COALESCE($4, status),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.time_slot_id)
        .bind(patch.date)
        .bind(patch.status)
        .bind(&patch.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(appointment))
    }

    async fn cancel(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = Self::lock(&mut *tx, id).await? else {
            return Ok(None);
        };

        Self::apply(&mut *tx, SlotTransition::for_removal(&current)).await?;

        sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(current))
    }
}

// Precisam de um Postgres de verdade: DATABASE_URL=... cargo test -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::{
        db::{DoctorRepository, DoctorStore, SlotStore, TimeSlotRepository, UserRepository, UserStore},
        models::{
            appointment::AppointmentStatus,
            auth::{NewUser, Role},
            time_slot::{NewSlot, TimeSlot},
        },
    };

    async fn slots(pool: &PgPool, starts: &[&str]) -> Vec<TimeSlot> {
        let user = UserRepository::new(pool.clone())
            .create(NewUser {
                email: "intern@clinic.test".to_string(),
                password_hash: "hash".to_string(),
                name: "Intern".to_string(),
                role: Role::Intern,
                phone: None,
            })
            .await
            .unwrap();
        let doctor = DoctorRepository::new(pool.clone())
            .find_by_user_id(user.id)
            .await
            .unwrap()
            .unwrap();

        let repo = TimeSlotRepository::new(pool.clone());
        let mut created = Vec::new();
        for start in starts {
            let slot = repo
                .create(NewSlot {
                    doctor_id: doctor.id,
                    day_of_week: 1,
                    start_time: start.to_string(),
                    end_time: "23:00".to_string(),
                    is_available: true,
                })
                .await
                .unwrap();
            created.push(slot);
        }
        created
    }

    fn booking(slot: &TimeSlot) -> NewAppointment {
        NewAppointment {
            customer_id: Uuid::new_v4(),
            doctor_id: slot.doctor_id,
            time_slot_id: slot.id,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            status: AppointmentStatus::Scheduled,
            scheduled_by: Uuid::new_v4(),
            notes: None,
        }
    }

    async fn is_available(pool: &PgPool, slot_id: Uuid) -> bool {
        TimeSlotRepository::new(pool.clone())
            .find_by_id(slot_id)
            .await
            .unwrap()
            .unwrap()
            .is_available
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn second_booking_of_a_taken_slot_rolls_back(pool: PgPool) {
        let slot = slots(&pool, &["09:00"]).await.remove(0);
        let repo = AppointmentRepository::new(pool.clone());

        repo.book(booking(&slot)).await.unwrap();
        let second = repo.book(booking(&slot)).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert!(!is_available(&pool, slot.id).await);
        assert_eq!(repo.list(&Visibility::All).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn failed_reschedule_keeps_the_old_slot(pool: PgPool) {
        let mut created = slots(&pool, &["09:00", "10:00"]).await;
        let (first, second) = (created.remove(0), created.remove(0));
        let repo = AppointmentRepository::new(pool.clone());

        let a = repo.book(booking(&first)).await.unwrap();
        repo.book(booking(&second)).await.unwrap();

        let patch = AppointmentPatch {
            time_slot_id: Some(second.id),
            ..Default::default()
        };
        assert!(matches!(repo.update(a.id, patch).await, Err(AppError::Conflict(_))));

        assert!(!is_available(&pool, first.id).await, "the old slot must stay taken");
        let a = repo.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a.time_slot_id, first.id);
    }

    #[sqlx::test]
    #[ignore = "requer DATABASE_URL"]
    async fn cancel_frees_the_slot_for_the_next_booking(pool: PgPool) {
        let slot = slots(&pool, &["09:00"]).await.remove(0);
        let repo = AppointmentRepository::new(pool.clone());

        let a = repo.book(booking(&slot)).await.unwrap();
        assert!(repo.cancel(a.id).await.unwrap().is_some());
        assert!(is_available(&pool, slot.id).await);

        repo.book(booking(&slot)).await.unwrap();
        assert!(!is_available(&pool, slot.id).await);
        assert!(repo.cancel(Uuid::new_v4()).await.unwrap().is_none());
    }
}
