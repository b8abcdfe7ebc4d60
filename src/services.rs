// src/services.rs

pub mod access;
pub mod appointment_service;
pub mod auth;
pub mod customer_service;
pub mod detail;
pub mod doctor_service;
pub mod slot_service;

#[cfg(test)]
pub mod testing;
