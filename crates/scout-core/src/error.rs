use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Empire Scout.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// A usage merge was requested with a zero match total.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// A replay source or workbook could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A source path does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// A source directory holds no replay files.
    #[error("No replay files found in {0}")]
    NoSources(PathBuf),

    /// A batch task ended before its source was handled.
    #[error("Ingest interrupted: {0}")]
    Interrupted(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the scout crates.
pub type Result<T> = std::result::Result<T, ScoutError>;
