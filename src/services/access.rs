// src/services/access.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{CustomerStore, DoctorStore},
    models::{
        access::Principal,
        auth::{Role, User},
    },
};

/// Resolve o usuário autenticado no `Principal` usado por todas as regras de
/// acesso. Perfis ausentes não são erro: o escopo resultante fica vazio.
#[derive(Clone)]
pub struct AccessPolicy {
    doctors: Arc<dyn DoctorStore>,
    customers: Arc<dyn CustomerStore>,
}

impl AccessPolicy {
    pub fn new(doctors: Arc<dyn DoctorStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self { doctors, customers }
    }

    pub async fn resolve(&self, user: User) -> Result<Principal, AppError> {
        let principal = match user.role {
            Role::Admin => Principal::Admin { user },
            Role::Therapist => {
                let doctor = self.doctors.find_by_user_id(user.id).await?;
                let intern_ids = match &doctor {
                    Some(doctor) => self
                        .doctors
                        .list_interns(&[doctor.id])
                        .await?
                        .into_iter()
                        .map(|intern| intern.id)
                        .collect(),
                    None => Vec::new(),
                };
                Principal::Therapist {
                    doctor_id: doctor.map(|d| d.id),
                    intern_ids,
                    user,
                }
            }
            Role::Intern => {
                let doctor = self.doctors.find_by_user_id(user.id).await?;
                Principal::Intern {
                    doctor_id: doctor.map(|d| d.id),
                    user,
                }
            }
            Role::Customer => {
                let customer = self.customers.find_by_user_id(user.id).await?;
                Principal::Customer {
                    customer_id: customer.map(|c| c.id),
                    user,
                }
            }
        };

        Ok(principal)
    }
}
