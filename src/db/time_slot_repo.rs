// src/db/time_slot_repo.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::time_slot::{NewSlot, TimeSlot},
};

const SLOT_COLUMNS: &str =
    "id, doctor_id, day_of_week, start_time, end_time, is_available, created_at, updated_at";

#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>, AppError>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TimeSlot>, AppError>;

    /// Ordenado por (dia da semana, início).
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<TimeSlot>, AppError>;

    /// `Conflict` se já existe horário com a mesma (doctor, dia, início).
    async fn create(&self, new_slot: NewSlot) -> Result<TimeSlot, AppError>;

    /// Insere ignorando duplicados pela chave (doctor, dia, início).
    /// Devolve quantos foram de fato inseridos.
    async fn insert_skip_duplicates(&self, slots: &[NewSlot]) -> Result<u64, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct TimeSlotRepository {
    pool: PgPool,
}

impl TimeSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for TimeSlotRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>, AppError> {
        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slot)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TimeSlot>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let slots = sqlx::query_as::<_, TimeSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<TimeSlot>, AppError> {
        let slots = sqlx::query_as::<_, TimeSlot>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM time_slots
            WHERE doctor_id = $1
            ORDER BY day_of_week ASC, start_time ASC
            "#
        ))
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    async fn create(&self, new_slot: NewSlot) -> Result<TimeSlot, AppError> {
        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            r#"
            INSERT INTO time_slots (doctor_id, day_of_week, start_time, end_time, is_available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(new_slot.doctor_id)
        .bind(new_slot.day_of_week)
        .bind(&new_slot.start_time)
        .bind(&new_slot.end_time)
        .bind(new_slot.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A time slot starting at this time already exists"))?;

        Ok(slot)
    }

    async fn insert_skip_duplicates(&self, slots: &[NewSlot]) -> Result<u64, AppError> {
        if slots.is_empty() {
            return Ok(0);
        }

        let doctor_ids: Vec<Uuid> = slots.iter().map(|s| s.doctor_id).collect();
        let days: Vec<i16> = slots.iter().map(|s| s.day_of_week).collect();
        let starts: Vec<String> = slots.iter().map(|s| s.start_time.clone()).collect();
        let ends: Vec<String> = slots.iter().map(|s| s.end_time.clone()).collect();
        let available: Vec<bool> = slots.iter().map(|s| s.is_available).collect();

        // Inserção em massa usando UNNEST para performance
        let result = sqlx::query(
            r#"
            INSERT INTO time_slots (doctor_id, day_of_week, start_time, end_time, is_available)
            SELECT * FROM UNNEST($1::uuid[], $2::int2[], $3::text[], $4::text[], $5::bool[])
            ON CONFLICT (doctor_id, day_of_week, start_time) DO NOTHING
            "#,
        )
        .bind(&doctor_ids)
        .bind(&days)
        .bind(&starts)
        .bind(&ends)
        .bind(&available)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ---
// Primitivas de disponibilidade, usadas dentro das transações de agendamento
// ---

/// Compare-and-swap: só ocupa o horário se ele ainda estiver livre.
pub(crate) async fn take_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE time_slots SET is_available = FALSE, updated_at = NOW()
        WHERE id = $1 AND is_available = TRUE
        "#,
    )
    .bind(slot_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM time_slots WHERE id = $1)")
        .bind(slot_id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Err(AppError::conflict("Time slot is not available"))
    } else {
        Err(AppError::not_found("Time slot not found"))
    }
}

/// Libera o horário. Horário já removido não é erro.
pub(crate) async fn release_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE time_slots SET is_available = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(slot_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
