//! Shared domain layer for Empire Scout.
//!
//! Holds the replay and usage models, the error type, CLI settings and the
//! small formatting helpers used by the reports.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, ScoutError};
