//! Shared module - Common types used across all features.

pub mod models;

pub use models::*;
