// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::auth::{NewUser, Role, User},
};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, phone, is_active, created_at, updated_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;

    /// Cria o usuário e, conforme o papel, o perfil de profissional ou de
    /// cliente. Tudo ou nada.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, role, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(new_user.role)
        .bind(&new_user.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "User with this email already exists"))?;

        // Perfis criados automaticamente conforme o papel
        match user.role {
            Role::Therapist | Role::Intern => {
                sqlx::query("INSERT INTO doctors (user_id, type) VALUES ($1, $2::doctor_type)")
                    .bind(user.id)
                    .bind(user.role.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Customer => {
                sqlx::query("INSERT INTO customers (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Admin => {}
        }

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(user)
    }
}
