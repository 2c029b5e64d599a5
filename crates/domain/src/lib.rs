//! Domain layer for the community registry.
//!
//! This crate contains:
//! - Domain models (Registration, Partner, statistics)
//! - Storage ports and their in-memory implementations
//! - Intake, rate limiting and statistics services
//! - Domain error types

pub mod errors;
pub mod memory;
pub mod models;
pub mod ports;
pub mod services;
