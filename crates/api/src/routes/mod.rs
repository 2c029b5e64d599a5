//! HTTP route handlers.

pub mod health;
pub mod partners;
pub mod registrations;
pub mod visits;
