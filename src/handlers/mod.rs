// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod classroom;
pub mod quiz;
pub mod submission;
