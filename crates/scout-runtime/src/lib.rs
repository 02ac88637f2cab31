//! Runtime orchestration layer for Empire Scout.
//!
//! Drives batch ingestion: concurrent reading and parsing of replay sources,
//! serialized updates of the persisted workbook.

pub mod orchestrator;

pub use scout_core as core;
pub use scout_data as data;
