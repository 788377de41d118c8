//! Configuration and domain models shared by every pipeline stage

pub mod config;
pub mod models;
