// src/models.rs

pub mod access;
pub mod appointment;
pub mod auth;
pub mod customer;
pub mod doctor;
pub mod time_slot;
