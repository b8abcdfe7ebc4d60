// src/db/doctor_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        access::Visibility,
        doctor::{Doctor, DoctorPatch, DoctorType, NewDoctor},
    },
};

const DOCTOR_COLUMNS: &str = "id, user_id, type, specialization, license_number, assigned_to_id, created_at, updated_at";

#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppError>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, AppError>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Doctor>, AppError>;

    /// Estagiários supervisionados pelos terapeutas (inverso de `assigned_to_id`),
    /// numa única consulta para todos os ids.
    async fn list_interns(&self, therapist_ids: &[Uuid]) -> Result<Vec<Doctor>, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, visibility: &Visibility) -> Result<Vec<Doctor>, AppError>;

    async fn list_by_type(&self, doctor_type: DoctorType) -> Result<Vec<Doctor>, AppError>;

    /// `Conflict` se o usuário já tem perfil de profissional.
    async fn create(&self, new_doctor: NewDoctor) -> Result<Doctor, AppError>;

    async fn update(&self, id: Uuid, patch: DoctorPatch) -> Result<Option<Doctor>, AppError>;

    async fn assign_supervisor(&self, intern_id: Uuid, therapist_id: Uuid) -> Result<Option<Doctor>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct DoctorRepository {
    pool: PgPool,
}

impl DoctorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoctorStore for DoctorRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, AppError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Doctor>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let doctors = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(doctors)
    }

    async fn list_interns(&self, therapist_ids: &[Uuid]) -> Result<Vec<Doctor>, AppError> {
        if therapist_ids.is_empty() {
            return Ok(Vec::new());
        }

        let interns = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE assigned_to_id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(therapist_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(interns)
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Doctor>, AppError> {
        let doctors = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Doctor>(&format!(
                    "SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Practitioners(ids) => {
                sqlx::query_as::<_, Doctor>(&format!(
                    "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ANY($1) ORDER BY created_at DESC"
                ))
                .bind(ids.as_slice())
                .fetch_all(&self.pool)
                .await?
            }
            // Clientes não enxergam perfis de profissionais pela listagem autenticada
            Visibility::Customer(_) | Visibility::Nothing => Vec::new(),
        };

        Ok(doctors)
    }

    async fn list_by_type(&self, doctor_type: DoctorType) -> Result<Vec<Doctor>, AppError> {
        let doctors = sqlx::query_as::<_, Doctor>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE type = $1 ORDER BY created_at DESC"
        ))
        .bind(doctor_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(doctors)
    }

    async fn create(&self, new_doctor: NewDoctor) -> Result<Doctor, AppError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            r#"
            INSERT INTO doctors (user_id, type, specialization, license_number, assigned_to_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(new_doctor.user_id)
        .bind(new_doctor.doctor_type)
        .bind(&new_doctor.specialization)
        .bind(&new_doctor.license_number)
        .bind(new_doctor.assigned_to_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Doctor profile already exists for this user"))?;

        Ok(doctor)
    }

    async fn update(&self, id: Uuid, patch: DoctorPatch) -> Result<Option<Doctor>, AppError> {
        // COALESCE: campo ausente no patch mantém o valor atual.
        // Quem vira terapeuta perde o supervisor.
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            r#"
            UPDATE doctors SET
                type = COALESCE($2, type),
                specialization = COALESCE($3, specialization),
                license_number = COALESCE($4, license_number),
                assigned_to_id = CASE
                    WHEN COALESCE($2, type) = 'therapist' THEN NULL
                    ELSE COALESCE($5, assigned_to_id)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.doctor_type)
        .bind(&patch.specialization)
        .bind(&patch.license_number)
        .bind(patch.assigned_to_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn assign_supervisor(&self, intern_id: Uuid, therapist_id: Uuid) -> Result<Option<Doctor>, AppError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!(
            r#"
            UPDATE doctors SET assigned_to_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(intern_id)
        .bind(therapist_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doctor)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
