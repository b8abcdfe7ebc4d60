// src/services/customer_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerStore, DoctorStore, UserStore},
    models::{
        access::Principal,
        auth::Role,
        customer::{Customer, CustomerDetail, CustomerPatch, NewCustomer},
        doctor::DoctorType,
    },
    services::detail::DetailLoader,
};

// Quem pode cadastrar e manter clientes
const MANAGERS: &[Role] = &[Role::Admin, Role::Therapist];

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
    doctors: Arc<dyn DoctorStore>,
    users: Arc<dyn UserStore>,
    details: DetailLoader,
}

impl CustomerService {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        doctors: Arc<dyn DoctorStore>,
        users: Arc<dyn UserStore>,
        details: DetailLoader,
    ) -> Self {
        Self {
            customers,
            doctors,
            users,
            details,
        }
    }

    pub async fn create(&self, principal: &Principal, new_customer: NewCustomer) -> Result<CustomerDetail, AppError> {
        principal.require_any(MANAGERS)?;

        if self.users.find_by_id(new_customer.user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        if self.customers.find_by_user_id(new_customer.user_id).await?.is_some() {
            return Err(AppError::conflict("Customer profile already exists for this user"));
        }
        if let Some(intern_id) = new_customer.assigned_intern_id {
            self.check_intern(intern_id).await?;
        }

        let customer = self.customers.create(new_customer).await?;
        tracing::info!("🧑 Cliente {} cadastrado", customer.id);

        self.details.customer(customer).await
    }

    /// Perfis ausentes resultam em lista vazia, nunca em erro.
    pub async fn list(&self, principal: &Principal) -> Result<Vec<CustomerDetail>, AppError> {
        let customers = self.customers.list(&principal.visibility()).await?;
        self.details.customers(customers).await
    }

    pub async fn get(&self, id: Uuid, principal: &Principal) -> Result<CustomerDetail, AppError> {
        let customer = self.find_visible(id, principal).await?;
        self.details.customer(customer).await
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, patch: CustomerPatch) -> Result<CustomerDetail, AppError> {
        principal.require_any(MANAGERS)?;
        self.find_visible(id, principal).await?;

        if let Some(intern_id) = patch.assigned_intern_id {
            self.check_intern(intern_id).await?;
        }

        let customer = self
            .customers
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;

        self.details.customer(customer).await
    }

    pub async fn assign_to_intern(
        &self,
        principal: &Principal,
        customer_id: Uuid,
        intern_id: Uuid,
    ) -> Result<CustomerDetail, AppError> {
        principal.require_any(MANAGERS)?;

        self.find(customer_id).await?;
        self.check_intern(intern_id).await?;

        let customer = self
            .customers
            .assign_intern(customer_id, intern_id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;
        tracing::info!("🔗 Cliente {} atribuído ao estagiário {}", customer.id, intern_id);

        self.details.customer(customer).await
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require_any(MANAGERS)?;
        self.find_visible(id, principal).await?;

        if !self.customers.delete(id).await? {
            return Err(AppError::not_found("Customer not found"));
        }
        tracing::info!("🗑️ Cliente {} removido", id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))
    }

    async fn find_visible(&self, id: Uuid, principal: &Principal) -> Result<Customer, AppError> {
        let customer = self.find(id).await?;
        if !principal.visibility().allows_customer(&customer) {
            tracing::warn!("🚫 {} sem acesso ao cliente {}", principal.user().email, id);
            return Err(AppError::forbidden("You do not have access to this customer"));
        }
        Ok(customer)
    }

    async fn check_intern(&self, intern_id: Uuid) -> Result<(), AppError> {
        let intern = self
            .doctors
            .find_by_id(intern_id)
            .await?
            .ok_or_else(|| AppError::not_found("Intern not found"))?;
        if intern.doctor_type != DoctorType::Intern {
            return Err(AppError::bad_request("Selected doctor is not an intern"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[tokio::test]
    async fn intern_sees_exactly_assigned_customers() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let intern = fx.intern("i@clinic.test").await;
        let other_intern = fx.intern("i2@clinic.test").await;
        let service = &fx.state.customer_service;

        let c1 = fx.customer("c1@clinic.test").await;
        let c2 = fx.customer("c2@clinic.test").await;
        let c3 = fx.customer("c3@clinic.test").await;
        for (customer, to) in [(&c1, &intern), (&c2, &intern), (&c3, &other_intern)] {
            service
                .assign_to_intern(&admin, customer.customer_id(), to.doctor_id())
                .await
                .unwrap();
        }

        let mut seen: Vec<Uuid> = service
            .list(&intern)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.customer.id)
            .collect();
        seen.sort();
        let mut expected = vec![c1.customer_id(), c2.customer_id()];
        expected.sort();
        assert_eq!(seen, expected);

        let err = service.get(c3.customer_id(), &intern).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn therapist_reaches_customers_of_own_interns() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.supervised_intern("i@clinic.test", &therapist).await;
        let therapist = fx.refresh(&therapist).await;
        let customer = fx.customer("c@clinic.test").await;

        fx.state
            .customer_service
            .assign_to_intern(&admin, customer.customer_id(), intern.doctor_id())
            .await
            .unwrap();

        let visible = fx.state.customer_service.list(&therapist).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(
            visible[0].assigned_intern.as_ref().map(|i| i.id),
            Some(intern.doctor_id())
        );
    }

    #[tokio::test]
    async fn customer_sees_only_self() {
        let fx = Fixture::new().await;
        let me = fx.customer("me@clinic.test").await;
        let other = fx.customer("other@clinic.test").await;

        let own = fx.state.customer_service.list(&me).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].customer.id, me.customer_id());

        let err = fx
            .state
            .customer_service
            .get(other.customer_id(), &me)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn assigning_to_a_therapist_is_rejected() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let customer = fx.customer("c@clinic.test").await;

        let err = fx
            .state
            .customer_service
            .assign_to_intern(&admin, customer.customer_id(), therapist.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn interns_cannot_create_customers() {
        let fx = Fixture::new().await;
        let intern = fx.intern("i@clinic.test").await;
        let new_customer = NewCustomer {
            user_id: intern.user().id,
            ..Default::default()
        };
        let err = fx
            .state
            .customer_service
            .create(&intern, new_customer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
