// src/services/mod.rs

//! Role- and ownership-checked operations shared by the HTTP handlers.

pub mod guard;
pub mod quiz;
pub mod submission;
