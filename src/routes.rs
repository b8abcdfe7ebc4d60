// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo. Usado pelo binário e pelos testes de integração.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (signup/login são públicas)
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/validate", get(handlers::auth::validate));

    let doctor_routes = Router::new()
        .route(
            "/",
            post(handlers::doctors::create_doctor).get(handlers::doctors::list_doctors),
        )
        .route("/therapists", get(handlers::doctors::list_therapists))
        .route("/assign-intern", post(handlers::doctors::assign_intern))
        .route(
            "/{id}",
            get(handlers::doctors::get_doctor)
                .patch(handlers::doctors::update_doctor)
                .delete(handlers::doctors::delete_doctor),
        );

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route("/assign-intern", post(handlers::customers::assign_to_intern))
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .patch(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        );

    let slot_routes = Router::new()
        .route("/", post(handlers::time_slots::create_slot))
        .route("/bulk", post(handlers::time_slots::bulk_create_slots))
        .route("/doctor/{doctor_id}", get(handlers::time_slots::list_doctor_slots))
        .route("/{id}", delete(handlers::time_slots::delete_slot));

    let appointment_routes = Router::new()
        .route(
            "/",
            post(handlers::appointments::create_appointment).get(handlers::appointments::list_appointments),
        )
        .route(
            "/{id}",
            get(handlers::appointments::get_appointment)
                .patch(handlers::appointments::update_appointment)
                .delete(handlers::appointments::delete_appointment),
        );

    // O guard só resolve o principal; cada handler decide se exige login
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/doctors", doctor_routes)
        .nest("/customers", customer_routes)
        .nest("/time-slots", slot_routes)
        .nest("/appointments", appointment_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
        .route("/health", get(|| async { "OK" }));

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
