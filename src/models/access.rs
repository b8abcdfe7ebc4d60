// src/models/access.rs

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{
    appointment::Appointment,
    auth::{Role, User},
    customer::Customer,
};

/// Identidade resolvida uma vez por requisição: papel + escopo.
///
/// Para terapeutas e estagiários o perfil de profissional pode não existir;
/// nesse caso `doctor_id` é `None` e o escopo fica vazio.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin {
        user: User,
    },
    Therapist {
        user: User,
        doctor_id: Option<Uuid>,
        intern_ids: Vec<Uuid>,
    },
    Intern {
        user: User,
        doctor_id: Option<Uuid>,
    },
    Customer {
        user: User,
        customer_id: Option<Uuid>,
    },
}

impl Principal {
    pub fn user(&self) -> &User {
        match self {
            Principal::Admin { user }
            | Principal::Therapist { user, .. }
            | Principal::Intern { user, .. }
            | Principal::Customer { user, .. } => user,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Admin { .. } => Role::Admin,
            Principal::Therapist { .. } => Role::Therapist,
            Principal::Intern { .. } => Role::Intern,
            Principal::Customer { .. } => Role::Customer,
        }
    }

    /// Porteiro por papel, equivalente ao `@Roles(...)` das rotas.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role()) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{}' is not allowed to perform this action",
                self.role().as_str()
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Admin])
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Principal::Admin { .. } => Visibility::All,
            Principal::Therapist {
                doctor_id: Some(id),
                intern_ids,
                ..
            } => {
                let mut ids = Vec::with_capacity(intern_ids.len() + 1);
                ids.push(*id);
                ids.extend(intern_ids.iter().copied());
                Visibility::Practitioners(ids)
            }
            Principal::Intern {
                doctor_id: Some(id),
                ..
            } => Visibility::Practitioners(vec![*id]),
            Principal::Customer {
                customer_id: Some(id),
                ..
            } => Visibility::Customer(*id),
            _ => Visibility::Nothing,
        }
    }
}

/// Escopo de leitura derivado do `Principal`, aplicado tanto nas listas
/// (como filtro do repositório) quanto nas verificações de registro único.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Profissionais alcançáveis: o próprio e, para terapeutas, os estagiários.
    Practitioners(Vec<Uuid>),
    /// Um cliente enxerga só o próprio perfil e os próprios agendamentos.
    Customer(Uuid),
    Nothing,
}

impl Visibility {
    pub fn allows_doctor(&self, doctor_id: Uuid) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Practitioners(ids) => ids.contains(&doctor_id),
            Visibility::Customer(_) | Visibility::Nothing => false,
        }
    }

    pub fn allows_customer(&self, customer: &Customer) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Practitioners(ids) => customer
                .assigned_intern_id
                .is_some_and(|intern_id| ids.contains(&intern_id)),
            Visibility::Customer(id) => customer.id == *id,
            Visibility::Nothing => false,
        }
    }

    pub fn allows_appointment(&self, appointment: &Appointment) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Practitioners(ids) => ids.contains(&appointment.doctor_id),
            Visibility::Customer(id) => appointment.customer_id == *id,
            Visibility::Nothing => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::models::appointment::AppointmentStatus;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@clinic.test", role.as_str()),
            password_hash: String::new(),
            name: role.as_str().to_string(),
            role,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(assigned_intern_id: Option<Uuid>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            assigned_intern_id,
            date_of_birth: None,
            address: None,
            emergency_contact: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn appointment(customer_id: Uuid, doctor_id: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer_id,
            doctor_id,
            time_slot_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            status: AppointmentStatus::Scheduled,
            scheduled_by: Uuid::new_v4(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn therapist_reaches_own_interns() {
        let therapist_id = Uuid::new_v4();
        let intern_id = Uuid::new_v4();
        let principal = Principal::Therapist {
            user: user(Role::Therapist),
            doctor_id: Some(therapist_id),
            intern_ids: vec![intern_id],
        };

        let visibility = principal.visibility();
        assert!(visibility.allows_doctor(therapist_id));
        assert!(visibility.allows_doctor(intern_id));
        assert!(!visibility.allows_doctor(Uuid::new_v4()));

        assert!(visibility.allows_customer(&customer(Some(intern_id))));
        assert!(!visibility.allows_customer(&customer(None)));
        assert!(visibility.allows_appointment(&appointment(Uuid::new_v4(), intern_id)));
    }

    #[test]
    fn missing_profile_degrades_to_nothing() {
        let principal = Principal::Intern {
            user: user(Role::Intern),
            doctor_id: None,
        };
        assert_eq!(principal.visibility(), Visibility::Nothing);
        assert!(!principal.visibility().allows_doctor(Uuid::new_v4()));
    }

    #[test]
    fn customer_sees_only_own_records() {
        let own = customer(None);
        let other = customer(None);
        let principal = Principal::Customer {
            user: user(Role::Customer),
            customer_id: Some(own.id),
        };
        let visibility = principal.visibility();

        assert!(visibility.allows_customer(&own));
        assert!(!visibility.allows_customer(&other));
        assert!(visibility.allows_appointment(&appointment(own.id, Uuid::new_v4())));
        assert!(!visibility.allows_appointment(&appointment(other.id, Uuid::new_v4())));
        assert!(!visibility.allows_doctor(Uuid::new_v4()));
    }

    #[test]
    fn role_gate_rejects_unlisted_roles() {
        let principal = Principal::Customer {
            user: user(Role::Customer),
            customer_id: None,
        };
        assert!(principal.require_any(&[Role::Admin, Role::Therapist]).is_err());
        assert!(principal.require_any(&[Role::Customer]).is_ok());
        assert!(principal.require_admin().is_err());
    }
}
