//! Replay ingestion layer for Empire Scout.
//!
//! Tokenizes battle logs, reconstructs match data from them, aggregates
//! roster usage across matches and persists the resulting tables.

pub mod aggregator;
pub mod parser;
pub mod protocol;
pub mod reader;
pub mod workbook;

pub use scout_core as core;
