// src/db.rs

pub mod appointment_repo;
pub mod customer_repo;
pub mod doctor_repo;
pub mod memory;
pub mod time_slot_repo;
pub mod user_repo;

pub use appointment_repo::{AppointmentRepository, AppointmentStore};
pub use customer_repo::{CustomerRepository, CustomerStore};
pub use doctor_repo::{DoctorRepository, DoctorStore};
pub use memory::MemoryStore;
pub use time_slot_repo::{SlotStore, TimeSlotRepository};
pub use user_repo::{UserRepository, UserStore};

use std::sync::Arc;

use sqlx::PgPool;

/// Conjunto de repositórios injetado nos serviços.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub doctors: Arc<dyn DoctorStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub slots: Arc<dyn SlotStore>,
    pub appointments: Arc<dyn AppointmentStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            doctors: Arc::new(DoctorRepository::new(pool.clone())),
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            slots: Arc::new(TimeSlotRepository::new(pool.clone())),
            appointments: Arc::new(AppointmentRepository::new(pool)),
        }
    }

    /// Todas as "tabelas" compartilham o mesmo `MemoryStore`.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            doctors: store.clone(),
            customers: store.clone(),
            slots: store.clone(),
            appointments: store,
        }
    }
}
