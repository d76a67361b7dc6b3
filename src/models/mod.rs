// src/models/mod.rs

pub mod classroom;
pub mod question;
pub mod quiz;
pub mod submission;
pub mod user;
