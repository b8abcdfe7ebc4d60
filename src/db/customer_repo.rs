// src/db/customer_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        access::Visibility,
        customer::{Customer, CustomerPatch, NewCustomer},
    },
};

const CUSTOMER_COLUMNS: &str = "id, user_id, assigned_intern_id, date_of_birth, address, emergency_contact, notes, created_at, updated_at";

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Customer>, AppError>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Customer>, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, visibility: &Visibility) -> Result<Vec<Customer>, AppError>;

    /// `Conflict` se o usuário já tem perfil de cliente.
    async fn create(&self, new_customer: NewCustomer) -> Result<Customer, AppError>;

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, AppError>;

    async fn assign_intern(&self, id: Uuid, intern_id: Uuid) -> Result<Option<Customer>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Customer>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Customer>, AppError> {
        let customers = match visibility {
            Visibility::All => {
                sqlx::query_as::<_, Customer>(&format!(
                    "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Practitioners(ids) => {
                sqlx::query_as::<_, Customer>(&format!(
                    r#"
                    SELECT {CUSTOMER_COLUMNS} FROM customers
                    WHERE assigned_intern_id = ANY($1)
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(ids.as_slice())
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Customer(id) => {
                sqlx::query_as::<_, Customer>(&format!(
                    "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            Visibility::Nothing => Vec::new(),
        };

        Ok(customers)
    }

    async fn create(&self, new_customer: NewCustomer) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (
                user_id, assigned_intern_id, date_of_birth, address, emergency_contact, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(new_customer.user_id)
        .bind(new_customer.assigned_intern_id)
        .bind(new_customer.date_of_birth)
        .bind(&new_customer.address)
        .bind(&new_customer.emergency_contact)
        .bind(&new_customer.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Customer profile already exists for this user"))?;

        Ok(customer)
    }

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET
                assigned_intern_id = COALESCE($2, assigned_intern_id),
                date_of_birth = COALESCE($3, date_of_birth),
                address = COALESCE($4, address),
                emergency_contact = COALESCE($5, emergency_contact),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.assigned_intern_id)
        .bind(patch.date_of_birth)
        .bind(&patch.address)
        .bind(&patch.emergency_contact)
        .bind(&patch.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn assign_intern(&self, id: Uuid, intern_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET assigned_intern_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(intern_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
