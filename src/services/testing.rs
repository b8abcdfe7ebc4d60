// src/services/testing.rs

use uuid::Uuid;

use crate::{
    config::{AppState, Config, StorageKind},
    db::Stores,
    models::{
        access::Principal,
        auth::{NewUser, Role},
    },
};

/// Estado completo sobre `MemoryStore`, com atalhos para criar usuários já
/// resolvidos em `Principal`.
pub struct Fixture {
    pub state: AppState,
    pub stores: Stores,
}

impl Fixture {
    pub async fn new() -> Self {
        let config = Config {
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            bcrypt_cost: 4,
            bind_addr: "127.0.0.1:0".to_string(),
            max_connections: 1,
            storage: StorageKind::Memory,
        };
        let stores = Stores::memory();
        let state = AppState::from_stores(stores.clone(), &config);
        Self { state, stores }
    }

    pub async fn principal(&self, email: &str, role: Role) -> Principal {
        let user = self
            .stores
            .users
            .create(NewUser {
                email: email.to_string(),
                password_hash: String::new(),
                name: email.to_string(),
                role,
                phone: None,
            })
            .await
            .unwrap();
        self.state.access_policy.resolve(user).await.unwrap()
    }

    pub async fn admin(&self) -> Principal {
        self.principal("admin@clinic.test", Role::Admin).await
    }

    pub async fn therapist(&self, email: &str) -> Principal {
        self.principal(email, Role::Therapist).await
    }

    pub async fn intern(&self, email: &str) -> Principal {
        self.principal(email, Role::Intern).await
    }

    pub async fn customer(&self, email: &str) -> Principal {
        self.principal(email, Role::Customer).await
    }

    /// Cria um estagiário já supervisionado. O terapeuta precisa de `refresh`
    /// para enxergar o novo estagiário.
    pub async fn supervised_intern(&self, email: &str, therapist: &Principal) -> Principal {
        let intern = self.intern(email).await;
        self.stores
            .doctors
            .assign_supervisor(intern.doctor_id(), therapist.doctor_id())
            .await
            .unwrap();
        self.refresh(&intern).await
    }

    pub async fn refresh(&self, principal: &Principal) -> Principal {
        self.state
            .access_policy
            .resolve(principal.user().clone())
            .await
            .unwrap()
    }
}

impl Principal {
    pub fn doctor_id(&self) -> Uuid {
        match self {
            Principal::Therapist { doctor_id: Some(id), .. } | Principal::Intern { doctor_id: Some(id), .. } => *id,
            other => panic!("{:?} não tem perfil de médico", other.role()),
        }
    }

    pub fn customer_id(&self) -> Uuid {
        match self {
            Principal::Customer { customer_id: Some(id), .. } => *id,
            other => panic!("{:?} não tem perfil de cliente", other.role()),
        }
    }
}
