// src/db/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        appointment_repo::AppointmentStore, customer_repo::CustomerStore, doctor_repo::DoctorStore,
        time_slot_repo::SlotStore, user_repo::UserStore,
    },
    models::{
        access::Visibility,
        appointment::{Appointment, AppointmentPatch, NewAppointment, SlotTransition},
        auth::{NewUser, Role, User},
        customer::{Customer, CustomerPatch, NewCustomer},
        doctor::{Doctor, DoctorPatch, DoctorType, NewDoctor},
        time_slot::{NewSlot, TimeSlot},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    doctors: Vec<Doctor>,
    customers: Vec<Customer>,
    slots: Vec<TimeSlot>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn slot_mut(&mut self, id: Uuid) -> Option<&mut TimeSlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    // Mesmo contrato do compare-and-swap do Postgres, mas sem efeito colateral.
    fn check_take(&self, slot_id: Uuid) -> Result<(), AppError> {
        match self.slots.iter().find(|s| s.id == slot_id) {
            None => Err(AppError::not_found("Time slot not found")),
            Some(slot) if !slot.is_available => Err(AppError::conflict("Time slot is not available")),
            Some(_) => Ok(()),
        }
    }

    fn apply(&mut self, transition: SlotTransition) -> Result<(), AppError> {
        if let Some(slot_id) = transition.take {
            self.check_take(slot_id)?;
        }

        let now = Utc::now();
        if let Some(slot) = transition.release.and_then(|id| self.slot_mut(id)) {
            slot.is_available = true;
            slot.updated_at = now;
        }
        if let Some(slot) = transition.take.and_then(|id| self.slot_mut(id)) {
            slot.is_available = false;
            slot.updated_at = now;
        }
        Ok(())
    }

    fn insert_doctor(&mut self, new_doctor: NewDoctor) -> Result<Doctor, AppError> {
        if self.doctors.iter().any(|d| d.user_id == new_doctor.user_id) {
            return Err(AppError::conflict("Doctor profile already exists for this user"));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: new_doctor.user_id,
            doctor_type: new_doctor.doctor_type,
            specialization: new_doctor.specialization,
            license_number: new_doctor.license_number,
            assigned_to_id: new_doctor.assigned_to_id,
            created_at: now,
            updated_at: now,
        };
        self.doctors.push(doctor.clone());
        Ok(doctor)
    }

    fn insert_customer(&mut self, new_customer: NewCustomer) -> Result<Customer, AppError> {
        if self.customers.iter().any(|c| c.user_id == new_customer.user_id) {
            return Err(AppError::conflict("Customer profile already exists for this user"));
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            user_id: new_customer.user_id,
            assigned_intern_id: new_customer.assigned_intern_id,
            date_of_birth: new_customer.date_of_birth,
            address: new_customer.address,
            emergency_contact: new_customer.emergency_contact,
            notes: new_customer.notes,
            created_at: now,
            updated_at: now,
        };
        self.customers.push(customer.clone());
        Ok(customer)
    }
}

/// Armazenamento em memória com a mesma semântica dos repositórios Postgres.
/// Um único lock por operação garante a atomicidade das reservas.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Mais recentes primeiro, mantendo a ordem de inserção nos empates
fn newest_first<T: Clone>(rows: impl Iterator<Item = T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.reverse();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("User with this email already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            role: new_user.role,
            phone: new_user.phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let doctor_type = match user.role {
            Role::Therapist => Some(DoctorType::Therapist),
            Role::Intern => Some(DoctorType::Intern),
            _ => None,
        };
        if let Some(doctor_type) = doctor_type {
            tables.insert_doctor(NewDoctor {
                user_id: user.id,
                doctor_type,
                specialization: None,
                license_number: None,
                assigned_to_id: None,
            })?;
        } else if user.role == Role::Customer {
            tables.insert_customer(NewCustomer {
                user_id: user.id,
                ..Default::default()
            })?;
        }

        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl DoctorStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.user_id == user_id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Doctor>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
    }

    async fn list_interns(&self, therapist_ids: &[Uuid]) -> Result<Vec<Doctor>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .doctors
            .iter()
            .filter(|d| d.assigned_to_id.is_some_and(|t| therapist_ids.contains(&t)))
            .cloned()
            .collect())
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Doctor>, AppError> {
        let tables = self.tables.read().await;
        let visible = tables.doctors.iter().filter(|d| match visibility {
            Visibility::All => true,
            Visibility::Practitioners(ids) => ids.contains(&d.id),
            Visibility::Customer(_) | Visibility::Nothing => false,
        });
        Ok(newest_first(visible.cloned(), |d| d.created_at))
    }

    async fn list_by_type(&self, doctor_type: DoctorType) -> Result<Vec<Doctor>, AppError> {
        let tables = self.tables.read().await;
        let matching = tables.doctors.iter().filter(|d| d.doctor_type == doctor_type);
        Ok(newest_first(matching.cloned(), |d| d.created_at))
    }

    async fn create(&self, new_doctor: NewDoctor) -> Result<Doctor, AppError> {
        let mut tables = self.tables.write().await;
        tables.insert_doctor(new_doctor)
    }

    async fn update(&self, id: Uuid, patch: DoctorPatch) -> Result<Option<Doctor>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(doctor) = tables.doctors.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        if let Some(doctor_type) = patch.doctor_type {
            doctor.doctor_type = doctor_type;
        }
        if patch.specialization.is_some() {
            doctor.specialization = patch.specialization;
        }
        if patch.license_number.is_some() {
            doctor.license_number = patch.license_number;
        }
        if doctor.doctor_type == DoctorType::Therapist {
            doctor.assigned_to_id = None;
        } else if patch.assigned_to_id.is_some() {
            doctor.assigned_to_id = patch.assigned_to_id;
        }
        doctor.updated_at = Utc::now();

        Ok(Some(doctor.clone()))
    }

    async fn assign_supervisor(&self, intern_id: Uuid, therapist_id: Uuid) -> Result<Option<Doctor>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(intern) = tables.doctors.iter_mut().find(|d| d.id == intern_id) else {
            return Ok(None);
        };

        intern.assigned_to_id = Some(therapist_id);
        intern.updated_at = Utc::now();
        Ok(Some(intern.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.doctors.len();
        tables.doctors.retain(|d| d.id != id);
        if tables.doctors.len() == before {
            return Ok(false);
        }

        // Espelha ON DELETE SET NULL / CASCADE do esquema
        for doctor in tables.doctors.iter_mut().filter(|d| d.assigned_to_id == Some(id)) {
            doctor.assigned_to_id = None;
        }
        for customer in tables.customers.iter_mut().filter(|c| c.assigned_intern_id == Some(id)) {
            customer.assigned_intern_id = None;
        }
        tables.slots.retain(|s| s.doctor_id != id);

        Ok(true)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Customer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Customer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().filter(|c| ids.contains(&c.id)).cloned().collect())
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Customer>, AppError> {
        let tables = self.tables.read().await;
        let visible = tables.customers.iter().filter(|c| match visibility {
            Visibility::All => true,
            Visibility::Practitioners(ids) => c.assigned_intern_id.is_some_and(|i| ids.contains(&i)),
            Visibility::Customer(id) => c.id == *id,
            Visibility::Nothing => false,
        });
        Ok(newest_first(visible.cloned(), |c| c.created_at))
    }

    async fn create(&self, new_customer: NewCustomer) -> Result<Customer, AppError> {
        let mut tables = self.tables.write().await;
        tables.insert_customer(new_customer)
    }

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<Option<Customer>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(customer) = tables.customers.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if patch.assigned_intern_id.is_some() {
            customer.assigned_intern_id = patch.assigned_intern_id;
        }
        if patch.date_of_birth.is_some() {
            customer.date_of_birth = patch.date_of_birth;
        }
        if patch.address.is_some() {
            customer.address = patch.address;
        }
        if patch.emergency_contact.is_some() {
            customer.emergency_contact = patch.emergency_contact;
        }
        if patch.notes.is_some() {
            customer.notes = patch.notes;
        }
        customer.updated_at = Utc::now();

        Ok(Some(customer.clone()))
    }

    async fn assign_intern(&self, id: Uuid, intern_id: Uuid) -> Result<Option<Customer>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(customer) = tables.customers.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        customer.assigned_intern_id = Some(intern_id);
        customer.updated_at = Utc::now();
        Ok(Some(customer.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.customers.len();
        tables.customers.retain(|c| c.id != id);
        Ok(tables.customers.len() != before)
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.slots.iter().find(|s| s.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TimeSlot>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.slots.iter().filter(|s| ids.contains(&s.id)).cloned().collect())
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<TimeSlot>, AppError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<TimeSlot> = tables
            .slots
            .iter()
            .filter(|s| s.doctor_id == doctor_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| (a.day_of_week, &a.start_time).cmp(&(b.day_of_week, &b.start_time)));
        Ok(slots)
    }

    async fn create(&self, new_slot: NewSlot) -> Result<TimeSlot, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .slots
            .iter()
            .any(|s| (s.doctor_id, s.day_of_week, s.start_time.as_str()) == new_slot.key())
        {
            return Err(AppError::conflict("A time slot starting at this time already exists"));
        }

        let slot = to_slot(new_slot);
        tables.slots.push(slot.clone());
        Ok(slot)
    }

    async fn insert_skip_duplicates(&self, slots: &[NewSlot]) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;

        for new_slot in slots {
            let duplicate = tables
                .slots
                .iter()
                .any(|s| (s.doctor_id, s.day_of_week, s.start_time.as_str()) == new_slot.key());
            if !duplicate {
                tables.slots.push(to_slot(new_slot.clone()));
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.slots.len();
        tables.slots.retain(|s| s.id != id);
        Ok(tables.slots.len() != before)
    }
}

fn to_slot(new_slot: NewSlot) -> TimeSlot {
    let now = Utc::now();
    TimeSlot {
        id: Uuid::new_v4(),
        doctor_id: new_slot.doctor_id,
        day_of_week: new_slot.day_of_week,
        start_time: new_slot.start_time,
        end_time: new_slot.end_time,
        is_available: new_slot.is_available,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, visibility: &Visibility) -> Result<Vec<Appointment>, AppError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| visibility.allows_appointment(a))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(appointments)
    }

    async fn book(&self, new_appointment: NewAppointment) -> Result<Appointment, AppError> {
        let mut tables = self.tables.write().await;

        let transition = SlotTransition {
            release: None,
            take: new_appointment
                .status
                .holds_slot()
                .then_some(new_appointment.time_slot_id),
        };
        tables.apply(transition)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            customer_id: new_appointment.customer_id,
            doctor_id: new_appointment.doctor_id,
            time_slot_id: new_appointment.time_slot_id,
            date: new_appointment.date,
            status: new_appointment.status,
            scheduled_by: new_appointment.scheduled_by,
            notes: new_appointment.notes,
            created_at: now,
            updated_at: now,
        };
        tables.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> Result<Option<Appointment>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.appointments.iter().find(|a| a.id == id).cloned() else {
            return Ok(None);
        };

        tables.apply(SlotTransition::for_update(&current, &patch))?;

        let Some(appointment) = tables.appointments.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(time_slot_id) = patch.time_slot_id {
            appointment.time_slot_id = time_slot_id;
        }
        if let Some(date) = patch.date {
            appointment.date = date;
        }
        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if patch.notes.is_some() {
            appointment.notes = patch.notes;
        }
        appointment.updated_at = Utc::now();

        Ok(Some(appointment.clone()))
    }

    async fn cancel(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.appointments.iter().find(|a| a.id == id).cloned() else {
            return Ok(None);
        };

        tables.apply(SlotTransition::for_removal(&current))?;
        tables.appointments.retain(|a| a.id != id);

        Ok(Some(current))
    }
}
