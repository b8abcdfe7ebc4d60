// src/services/doctor_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerStore, DoctorStore, UserStore},
    models::{
        access::{Principal, Visibility},
        doctor::{Doctor, DoctorDetail, DoctorPatch, DoctorType, NewDoctor},
    },
    services::detail::DetailLoader,
};

#[derive(Clone)]
pub struct DoctorService {
    doctors: Arc<dyn DoctorStore>,
    users: Arc<dyn UserStore>,
    customers: Arc<dyn CustomerStore>,
    details: DetailLoader,
}

impl DoctorService {
    pub fn new(
        doctors: Arc<dyn DoctorStore>,
        users: Arc<dyn UserStore>,
        customers: Arc<dyn CustomerStore>,
        details: DetailLoader,
    ) -> Self {
        Self {
            doctors,
            users,
            customers,
            details,
        }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    /// Sem principal (página pública de agendamento) a lista é completa.
    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<DoctorDetail>, AppError> {
        let visibility = principal.map_or(Visibility::All, Principal::visibility);
        let doctors = self.doctors.list(&visibility).await?;
        self.details.doctors(doctors).await
    }

    pub async fn list_therapists(&self, principal: &Principal) -> Result<Vec<DoctorDetail>, AppError> {
        principal.require_admin()?;
        let therapists = self.doctors.list_by_type(DoctorType::Therapist).await?;
        self.details.doctors(therapists).await
    }

    pub async fn get(&self, id: Uuid, principal: Option<&Principal>) -> Result<DoctorDetail, AppError> {
        let doctor = self.find(id).await?;

        if let Some(principal) = principal {
            if !principal.visibility().allows_doctor(doctor.id) {
                tracing::warn!("🚫 {} sem acesso ao médico {}", principal.user().email, id);
                return Err(AppError::forbidden("You do not have access to this doctor"));
            }
        }

        self.details.doctor(doctor).await
    }

    // =========================================================================
    //  ESCRITA (somente admin)
    // =========================================================================

    pub async fn create(&self, principal: &Principal, new_doctor: NewDoctor) -> Result<DoctorDetail, AppError> {
        principal.require_admin()?;

        if self.users.find_by_id(new_doctor.user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        if self.doctors.find_by_user_id(new_doctor.user_id).await?.is_some() {
            return Err(AppError::conflict("Doctor profile already exists for this user"));
        }
        if let Some(supervisor_id) = new_doctor.assigned_to_id {
            self.check_supervision(new_doctor.doctor_type, supervisor_id).await?;
        }

        let doctor = self.doctors.create(new_doctor).await?;
        tracing::info!("🩺 Médico {} criado ({:?})", doctor.id, doctor.doctor_type);

        self.details.doctor(doctor).await
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, patch: DoctorPatch) -> Result<DoctorDetail, AppError> {
        principal.require_admin()?;
        let current = self.find(id).await?;

        let next_type = patch.doctor_type.unwrap_or(current.doctor_type);
        if next_type != current.doctor_type {
            self.check_type_change(&current, next_type).await?;
        }
        if let Some(supervisor_id) = patch.assigned_to_id {
            if supervisor_id == id {
                return Err(AppError::bad_request("A doctor cannot supervise themselves"));
            }
            self.check_supervision(next_type, supervisor_id).await?;
        }

        let doctor = self
            .doctors
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor not found"))?;

        if doctor.doctor_type != current.doctor_type {
            tracing::info!("🔁 Médico {} agora é {:?}", doctor.id, doctor.doctor_type);
        }

        self.details.doctor(doctor).await
    }

    pub async fn assign_intern(
        &self,
        principal: &Principal,
        intern_id: Uuid,
        therapist_id: Uuid,
    ) -> Result<DoctorDetail, AppError> {
        principal.require_admin()?;

        let intern = self
            .doctors
            .find_by_id(intern_id)
            .await?
            .ok_or_else(|| AppError::not_found("Intern not found"))?;
        if intern.doctor_type != DoctorType::Intern {
            return Err(AppError::bad_request("Selected doctor is not an intern"));
        }

        let therapist = self
            .doctors
            .find_by_id(therapist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Therapist not found"))?;
        if therapist.doctor_type != DoctorType::Therapist {
            return Err(AppError::bad_request("Selected doctor is not a therapist"));
        }

        let intern = self
            .doctors
            .assign_supervisor(intern.id, therapist.id)
            .await?
            .ok_or_else(|| AppError::not_found("Intern not found"))?;
        tracing::info!("🔗 Estagiário {} supervisionado por {}", intern.id, therapist.id);

        self.details.doctor(intern).await
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require_admin()?;

        if !self.doctors.delete(id).await? {
            return Err(AppError::not_found("Doctor not found"));
        }
        tracing::info!("🗑️ Médico {} removido", id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Doctor, AppError> {
        self.doctors
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor not found"))
    }

    // Terapeuta com estagiários não vira estagiário, e estagiário com
    // clientes não vira terapeuta. O supervisor cai junto na promoção.
    async fn check_type_change(&self, current: &Doctor, next_type: DoctorType) -> Result<(), AppError> {
        match next_type {
            DoctorType::Intern => {
                if !self.doctors.list_interns(&[current.id]).await?.is_empty() {
                    return Err(AppError::bad_request(
                        "Therapist still supervises interns. Reassign them first",
                    ));
                }
            }
            DoctorType::Therapist => {
                let assigned = self
                    .customers
                    .list(&Visibility::Practitioners(vec![current.id]))
                    .await?;
                if !assigned.is_empty() {
                    return Err(AppError::bad_request(
                        "Intern still has assigned customers. Reassign them first",
                    ));
                }
            }
        }
        Ok(())
    }

    // Só estagiários têm supervisor, e o supervisor precisa ser terapeuta
    async fn check_supervision(&self, doctor_type: DoctorType, supervisor_id: Uuid) -> Result<(), AppError> {
        if doctor_type == DoctorType::Therapist {
            return Err(AppError::bad_request("A therapist cannot be assigned to a supervisor"));
        }

        let supervisor = self
            .doctors
            .find_by_id(supervisor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Therapist not found"))?;
        if supervisor.doctor_type != DoctorType::Therapist {
            return Err(AppError::bad_request("Selected doctor is not a therapist"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[tokio::test]
    async fn assign_intern_checks_both_types() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.intern("i@clinic.test").await;
        let admin = fx.admin().await;
        let service = &fx.state.doctor_service;

        let err = service
            .assign_intern(&admin, therapist.doctor_id(), therapist.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service
            .assign_intern(&admin, intern.doctor_id(), intern.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service
            .assign_intern(&admin, Uuid::new_v4(), therapist.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let detail = service
            .assign_intern(&admin, intern.doctor_id(), therapist.doctor_id())
            .await
            .unwrap();
        assert_eq!(detail.doctor.assigned_to_id, Some(therapist.doctor_id()));
        assert_eq!(detail.assigned_to.map(|t| t.id), Some(therapist.doctor_id()));
    }

    #[tokio::test]
    async fn only_admin_mutates_doctors() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.intern("i@clinic.test").await;

        let err = fx
            .state
            .doctor_service
            .assign_intern(&therapist, intern.doctor_id(), therapist.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = fx
            .state
            .doctor_service
            .delete(&therapist, intern.doctor_id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_principal() {
        let fx = Fixture::new().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.supervised_intern("i@clinic.test", &therapist).await;
        let _other = fx.intern("other@clinic.test").await;
        let therapist = fx.refresh(&therapist).await;

        assert_eq!(fx.state.doctor_service.list(None).await.unwrap().len(), 3);

        let mut seen: Vec<Uuid> = fx
            .state
            .doctor_service
            .list(Some(&therapist))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.doctor.id)
            .collect();
        seen.sort();
        let mut expected = vec![therapist.doctor_id(), intern.doctor_id()];
        expected.sort();
        assert_eq!(seen, expected);

        let own = fx.state.doctor_service.list(Some(&intern)).await.unwrap();
        assert_eq!(own.len(), 1);

        let err = fx
            .state
            .doctor_service
            .get(therapist.doctor_id(), Some(&intern))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn therapist_never_gets_a_supervisor() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let other = fx.therapist("t2@clinic.test").await;

        let patch = DoctorPatch {
            assigned_to_id: Some(other.doctor_id()),
            ..Default::default()
        };
        let err = fx
            .state
            .doctor_service
            .update(&admin, therapist.doctor_id(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn therapist_with_interns_cannot_become_an_intern() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let _intern = fx.supervised_intern("i@clinic.test", &therapist).await;

        let patch = DoctorPatch {
            doctor_type: Some(DoctorType::Intern),
            ..Default::default()
        };
        let err = fx
            .state
            .doctor_service
            .update(&admin, therapist.doctor_id(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let stored = fx.stores.doctors.find_by_id(therapist.doctor_id()).await.unwrap().unwrap();
        assert_eq!(stored.doctor_type, DoctorType::Therapist);
    }

    #[tokio::test]
    async fn intern_with_customers_cannot_become_a_therapist() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let intern = fx.intern("i@clinic.test").await;
        let customer = fx.customer("c@clinic.test").await;
        fx.state
            .customer_service
            .assign_to_intern(&admin, customer.customer_id(), intern.doctor_id())
            .await
            .unwrap();

        let patch = DoctorPatch {
            doctor_type: Some(DoctorType::Therapist),
            ..Default::default()
        };
        let err = fx
            .state
            .doctor_service
            .update(&admin, intern.doctor_id(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let stored = fx.stores.doctors.find_by_id(intern.doctor_id()).await.unwrap().unwrap();
        assert_eq!(stored.doctor_type, DoctorType::Intern);
    }

    #[tokio::test]
    async fn promoted_intern_loses_its_supervisor() {
        let fx = Fixture::new().await;
        let admin = fx.admin().await;
        let therapist = fx.therapist("t@clinic.test").await;
        let intern = fx.supervised_intern("i@clinic.test", &therapist).await;

        let patch = DoctorPatch {
            doctor_type: Some(DoctorType::Therapist),
            ..Default::default()
        };
        let detail = fx
            .state
            .doctor_service
            .update(&admin, intern.doctor_id(), patch)
            .await
            .unwrap();
        assert_eq!(detail.doctor.doctor_type, DoctorType::Therapist);
        assert_eq!(detail.doctor.assigned_to_id, None);
        assert!(detail.assigned_to.is_none());

        let therapist = fx
            .state
            .doctor_service
            .get(therapist.doctor_id(), None)
            .await
            .unwrap();
        assert!(therapist.interns.is_empty());
    }

    #[tokio::test]
    async fn details_group_interns_under_their_therapist() {
        let fx = Fixture::new().await;
        let first = fx.therapist("t1@clinic.test").await;
        let second = fx.therapist("t2@clinic.test").await;
        let a = fx.supervised_intern("a@clinic.test", &first).await;
        let b = fx.supervised_intern("b@clinic.test", &first).await;
        let c = fx.supervised_intern("c@clinic.test", &second).await;

        let listed = fx.state.doctor_service.list(None).await.unwrap();
        let interns_of = |id: Uuid| -> Vec<Uuid> {
            let detail = listed.iter().find(|d| d.doctor.id == id).unwrap();
            let mut ids: Vec<Uuid> = detail.interns.iter().map(|i| i.id).collect();
            ids.sort();
            ids
        };

        let mut expected = vec![a.doctor_id(), b.doctor_id()];
        expected.sort();
        assert_eq!(interns_of(first.doctor_id()), expected);
        assert_eq!(interns_of(second.doctor_id()), vec![c.doctor_id()]);
        assert!(interns_of(a.doctor_id()).is_empty());
    }
}
