//! Error handling
//!
//! Defines error types and handling for the storage subsystem.

pub mod handlers;
pub mod types;

pub use types::*;
