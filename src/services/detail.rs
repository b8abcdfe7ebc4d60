// src/services/detail.rs

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerStore, DoctorStore, SlotStore, Stores, UserStore},
    models::{
        appointment::{Appointment, AppointmentDetail, CustomerBrief},
        auth::UserSummary,
        customer::{Customer, CustomerDetail},
        doctor::{Doctor, DoctorBrief, DoctorDetail, DoctorType},
        time_slot::TimeSlot,
    },
};

/// Anexa as relações (usuário, supervisor, estagiários, horário...) às
/// respostas. Busca em lote para não fazer uma consulta por linha.
#[derive(Clone)]
pub struct DetailLoader {
    users: Arc<dyn UserStore>,
    doctors: Arc<dyn DoctorStore>,
    customers: Arc<dyn CustomerStore>,
    slots: Arc<dyn SlotStore>,
}

impl DetailLoader {
    pub fn new(stores: &Stores) -> Self {
        Self {
            users: stores.users.clone(),
            doctors: stores.doctors.clone(),
            customers: stores.customers.clone(),
            slots: stores.slots.clone(),
        }
    }

    async fn user_summaries(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, UserSummary>, AppError> {
        let users = self.users.find_many(&dedup(ids)).await?;
        Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
    }

    async fn doctor_briefs(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, DoctorBrief>, AppError> {
        let doctors = self.doctors.find_many(&dedup(ids)).await?;
        let users = self
            .user_summaries(doctors.iter().map(|d| d.user_id).collect())
            .await?;

        Ok(doctors
            .into_iter()
            .map(|d| (d.id, brief(&d, &users)))
            .collect())
    }

    pub async fn doctor(&self, doctor: Doctor) -> Result<DoctorDetail, AppError> {
        let mut details = self.doctors(vec![doctor]).await?;
        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("detalhe do médico não montado").into())
    }

    pub async fn doctors(&self, doctors: Vec<Doctor>) -> Result<Vec<DoctorDetail>, AppError> {
        let therapist_ids: Vec<Uuid> = doctors
            .iter()
            .filter(|d| d.doctor_type == DoctorType::Therapist)
            .map(|d| d.id)
            .collect();
        let mut interns_by_therapist: HashMap<Uuid, Vec<Doctor>> = HashMap::new();
        for intern in self.doctors.list_interns(&therapist_ids).await? {
            if let Some(therapist_id) = intern.assigned_to_id {
                interns_by_therapist.entry(therapist_id).or_default().push(intern);
            }
        }

        let mut user_ids: Vec<Uuid> = doctors.iter().map(|d| d.user_id).collect();
        user_ids.extend(interns_by_therapist.values().flatten().map(|i| i.user_id));
        let users = self.user_summaries(user_ids).await?;

        let supervisors = self
            .doctor_briefs(doctors.iter().filter_map(|d| d.assigned_to_id).collect())
            .await?;

        Ok(doctors
            .into_iter()
            .map(|doctor| {
                let interns = interns_by_therapist
                    .get(&doctor.id)
                    .map(|interns| interns.iter().map(|i| brief(i, &users)).collect())
                    .unwrap_or_default();
                DoctorDetail {
                    user: users.get(&doctor.user_id).cloned(),
                    assigned_to: doctor.assigned_to_id.and_then(|id| supervisors.get(&id).cloned()),
                    interns,
                    doctor,
                }
            })
            .collect())
    }

    pub async fn customer(&self, customer: Customer) -> Result<CustomerDetail, AppError> {
        let mut details = self.customers(vec![customer]).await?;
        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("detalhe do cliente não montado").into())
    }

    pub async fn customers(&self, customers: Vec<Customer>) -> Result<Vec<CustomerDetail>, AppError> {
        let users = self
            .user_summaries(customers.iter().map(|c| c.user_id).collect())
            .await?;
        let interns = self
            .doctor_briefs(customers.iter().filter_map(|c| c.assigned_intern_id).collect())
            .await?;

        Ok(customers
            .into_iter()
            .map(|customer| CustomerDetail {
                user: users.get(&customer.user_id).cloned(),
                assigned_intern: customer
                    .assigned_intern_id
                    .and_then(|id| interns.get(&id).cloned()),
                customer,
            })
            .collect())
    }

    pub async fn appointment(&self, appointment: Appointment) -> Result<AppointmentDetail, AppError> {
        let mut details = self.appointments(vec![appointment]).await?;
        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("detalhe do agendamento não montado").into())
    }

    pub async fn appointments(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentDetail>, AppError> {
        let customers = self
            .customers
            .find_many(&dedup(appointments.iter().map(|a| a.customer_id).collect()))
            .await?;
        let customer_users = self
            .user_summaries(customers.iter().map(|c| c.user_id).collect())
            .await?;
        let customers: HashMap<Uuid, CustomerBrief> = customers
            .iter()
            .map(|c| {
                let brief = CustomerBrief {
                    id: c.id,
                    user: customer_users.get(&c.user_id).cloned(),
                };
                (c.id, brief)
            })
            .collect();

        let doctors = self
            .doctor_briefs(appointments.iter().map(|a| a.doctor_id).collect())
            .await?;

        let slots: HashMap<Uuid, TimeSlot> = self
            .slots
            .find_many(&dedup(appointments.iter().map(|a| a.time_slot_id).collect()))
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        // Referências fracas: o registro relacionado pode já ter sido removido
        Ok(appointments
            .into_iter()
            .map(|appointment| AppointmentDetail {
                customer: customers.get(&appointment.customer_id).cloned(),
                doctor: doctors.get(&appointment.doctor_id).cloned(),
                time_slot: slots.get(&appointment.time_slot_id).cloned(),
                appointment,
            })
            .collect())
    }
}

fn brief(doctor: &Doctor, users: &HashMap<Uuid, UserSummary>) -> DoctorBrief {
    DoctorBrief {
        id: doctor.id,
        doctor_type: doctor.doctor_type,
        specialization: doctor.specialization.clone(),
        user: users.get(&doctor.user_id).cloned(),
    }
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
