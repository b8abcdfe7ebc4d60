// src/handlers.rs

pub mod appointments;
pub mod auth;
pub mod customers;
pub mod doctors;
pub mod time_slots;
