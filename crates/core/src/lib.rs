//! Core types and utilities for the token aggregator
//!
//! This crate provides shared types used across all components:
//! - Token records and provenance tags
//! - Sort keys and cursor pagination
//! - Configuration types
//! - Error types

pub mod types;
pub mod pagination;
pub mod config;
pub mod errors;

pub use types::*;
pub use pagination::*;
pub use config::*;
pub use errors::*;
