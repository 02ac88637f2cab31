use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR: &str = ".empire-scout";

/// Default workbook file name inside [`APP_DIR`].
pub const DEFAULT_WORKBOOK_FILE: &str = "workbook.json";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Battle replay scouting: parse logs, track teams, moves and usage
#[derive(Parser, Debug, Clone)]
#[command(
    name = "empire-scout",
    about = "Battle replay scouting: parse logs, track teams, moves and usage",
    version
)]
pub struct Settings {
    /// Replay log files or directories to ingest
    pub sources: Vec<PathBuf>,

    /// Link recorded for the replay (only valid with a single file source)
    #[arg(long)]
    pub link: Option<String>,

    /// Workbook file holding matches, teams and usage
    #[arg(long)]
    pub workbook: Option<PathBuf>,

    /// Table printed after ingestion
    #[arg(long, default_value = "usage", value_parser = ["usage", "matches", "teams", "none"])]
    pub view: String,

    /// Only print the first N usage rows
    #[arg(long)]
    pub top: Option<usize>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.empire-scout/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve the workbook path, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Failed to clear {}: {}", config_path.display(), e);
            }
            return Self::resolve_defaults(settings, config_path);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "workbook") && settings.workbook.is_none() {
            settings.workbook = last.workbook;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top") && settings.top.is_none() {
            settings.top = last.top;
        }

        settings = Self::resolve_defaults(settings, config_path);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!("Failed to persist {}: {}", config_path.display(), e);
        }

        settings
    }

    /// Workbook path, falling back to `~/.empire-scout/workbook.json`.
    pub fn workbook_path(&self) -> PathBuf {
        self.workbook
            .clone()
            .unwrap_or_else(|| default_workbook_path_in(&home_dir()))
    }

    /// Fill in the workbook default beside the config file and apply `--debug`.
    fn resolve_defaults(mut settings: Settings, config_path: &Path) -> Settings {
        if settings.workbook.is_none() {
            let dir = config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| home_dir().join(APP_DIR));
            settings.workbook = Some(dir.join(DEFAULT_WORKBOOK_FILE));
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            workbook: s.workbook.clone(),
            view: Some(s.view.clone()),
            top: s.top,
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Default workbook location rooted at `base_dir`.
pub fn default_workbook_path_in(base_dir: &Path) -> PathBuf {
    base_dir.join(APP_DIR).join(DEFAULT_WORKBOOK_FILE)
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
