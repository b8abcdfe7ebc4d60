// src/common.rs

pub mod clock;
pub mod error;
pub mod response;
