// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common::response;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::validate,

        // --- Doctors ---
        handlers::doctors::create_doctor,
        handlers::doctors::list_doctors,
        handlers::doctors::list_therapists,
        handlers::doctors::get_doctor,
        handlers::doctors::update_doctor,
        handlers::doctors::assign_intern,
        handlers::doctors::delete_doctor,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::assign_to_intern,
        handlers::customers::delete_customer,

        // --- Time Slots ---
        handlers::time_slots::create_slot,
        handlers::time_slots::bulk_create_slots,
        handlers::time_slots::list_doctor_slots,
        handlers::time_slots::delete_slot,

        // --- Appointments ---
        handlers::appointments::create_appointment,
        handlers::appointments::list_appointments,
        handlers::appointments::get_appointment,
        handlers::appointments::update_appointment,
        handlers::appointments::delete_appointment,
    ),
    components(
        schemas(
            response::MessageResponse,

            // --- Auth ---
            models::auth::Role,
            models::auth::UserSummary,
            models::auth::SignupPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Doctors ---
            models::doctor::DoctorType,
            models::doctor::Doctor,
            models::doctor::DoctorBrief,
            models::doctor::DoctorDetail,
            models::doctor::CreateDoctorPayload,
            models::doctor::DoctorPatch,
            models::doctor::AssignInternPayload,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerDetail,
            models::customer::CreateCustomerPayload,
            models::customer::CustomerPatch,
            models::customer::AssignCustomerPayload,

            // --- Time Slots ---
            models::time_slot::TimeSlot,
            models::time_slot::CreateSlotPayload,
            models::time_slot::BulkCreateSlotsPayload,
            models::time_slot::BulkCreateResponse,

            // --- Appointments ---
            models::appointment::AppointmentStatus,
            models::appointment::Appointment,
            models::appointment::CustomerBrief,
            models::appointment::AppointmentDetail,
            models::appointment::CreateAppointmentPayload,
            models::appointment::AppointmentPatch,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e validação de token"),
        (name = "Doctors", description = "Terapeutas e estagiários"),
        (name = "Customers", description = "Clientes (pacientes)"),
        (name = "Time Slots", description = "Agenda semanal dos profissionais"),
        (name = "Appointments", description = "Reservas de horário")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
