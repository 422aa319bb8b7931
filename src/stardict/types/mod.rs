//! Foundational data structures, error types, and content type definitions.

pub mod content_type;
pub mod error;
pub mod models;
