// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::Stores,
    services::{
        access::AccessPolicy, appointment_service::AppointmentService, auth::AuthService,
        customer_service::CustomerService, detail::DetailLoader, doctor_service::DoctorService,
        slot_service::SlotService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

/// Configuração lida das variáveis de ambiente (com suporte a `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
    pub max_connections: u32,
    pub storage: StorageKind,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage = match env::var("STORAGE").as_deref() {
            Ok("memory") => StorageKind::Memory,
            Ok("postgres") | Err(_) => StorageKind::Postgres,
            Ok(other) => anyhow::bail!("STORAGE inválido: '{}' (use postgres ou memory)", other),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let jwt_expiration_hours = match env::var("JWT_EXPIRATION_HOURS") {
            Ok(raw) => raw.parse().context("JWT_EXPIRATION_HOURS deve ser um número")?,
            Err(_) => 24 * 7,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => raw.parse().context("BCRYPT_COST deve ser um número")?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("DATABASE_MAX_CONNECTIONS deve ser um número")?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            max_connections,
            storage,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub access_policy: AccessPolicy,
    pub doctor_service: DoctorService,
    pub customer_service: CustomerService,
    pub slot_service: SlotService,
    pub appointment_service: AppointmentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let stores = match config.storage {
            StorageKind::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: os dados somem ao reiniciar.");
                Stores::memory()
            }
            StorageKind::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados.")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Stores::postgres(db_pool)
            }
        };

        Ok(Self::from_stores(stores, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_stores(stores: Stores, config: &Config) -> Self {
        let details = DetailLoader::new(&stores);

        Self {
            auth_service: AuthService::new(
                stores.users.clone(),
                config.jwt_secret.clone(),
                config.jwt_expiration_hours,
                config.bcrypt_cost,
            ),
            access_policy: AccessPolicy::new(stores.doctors.clone(), stores.customers.clone()),
            doctor_service: DoctorService::new(
                stores.doctors.clone(),
                stores.users.clone(),
                stores.customers.clone(),
                details.clone(),
            ),
            customer_service: CustomerService::new(
                stores.customers.clone(),
                stores.doctors.clone(),
                stores.users.clone(),
                details.clone(),
            ),
            slot_service: SlotService::new(stores.slots.clone(), stores.doctors.clone()),
            appointment_service: AppointmentService::new(
                stores.appointments.clone(),
                stores.customers.clone(),
                stores.doctors.clone(),
                stores.slots.clone(),
                details,
            ),
        }
    }
}
