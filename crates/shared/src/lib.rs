//! Shared utilities for the community registry backend.
//!
//! This crate provides functionality used across the other crates:
//! - Free-text sanitization
//! - Required-field and email-shape validation
//! - Character-safe truncation

pub mod validation;
