//! Replay source discovery and loading.
//!
//! Sources are local files: either given directly or found by walking a
//! directory for saved replay logs and pages.

use std::path::{Path, PathBuf};

use scout_core::error::{Result, ScoutError};
use tracing::{debug, warn};

/// File extensions treated as replay logs when scanning a directory.
pub const REPLAY_EXTENSIONS: [&str; 4] = ["log", "txt", "html", "htm"];

/// One replay to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySource {
    pub path: PathBuf,
    /// Link stored in the matches table. Defaults to the path.
    pub link: String,
}

impl ReplaySource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let link = path.display().to_string();
        Self { path, link }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all replay files recursively under `dir`, sorted by path.
pub fn find_replay_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Source directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_replay_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand command-line paths into replay sources, keeping argument order.
///
/// Files are taken as-is whatever their extension; directories expand to
/// their replay files in path order.
pub fn resolve_sources(paths: &[PathBuf]) -> Result<Vec<ReplaySource>> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = find_replay_files(path);
            if found.is_empty() {
                return Err(ScoutError::NoSources(path.clone()));
            }
            debug!("{}: {} replay files", path.display(), found.len());
            sources.extend(found.into_iter().map(ReplaySource::from_path));
        } else if path.is_file() {
            sources.push(ReplaySource::from_path(path.clone()));
        } else {
            return Err(ScoutError::SourceNotFound(path.clone()));
        }
    }

    Ok(sources)
}

/// Attach an explicit link to the only source of a batch.
///
/// A link names exactly one replay, so it is rejected for batches of any
/// other size.
pub fn apply_link(
    mut sources: Vec<ReplaySource>,
    link: Option<&str>,
) -> Result<Vec<ReplaySource>> {
    let Some(link) = link else {
        return Ok(sources);
    };
    if sources.len() != 1 {
        return Err(ScoutError::Config(format!(
            "--link needs exactly one replay, got {}",
            sources.len()
        )));
    }
    sources[0].link = link.to_string();
    Ok(sources)
}

/// Read a replay file as text. Invalid UTF-8 is replaced rather than rejected.
pub fn read_replay(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ScoutError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} is not valid UTF-8; decoding lossily", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn has_replay_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            REPLAY_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_find_replay_files_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.log", "");
        touch(tmp.path(), "a.HTML", "");
        touch(tmp.path(), "nested/c.txt", "");
        touch(tmp.path(), "sprite.png", "");
        touch(tmp.path(), "notes", "");

        let files = find_replay_files(tmp.path());
        let rel: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(tmp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(rel, vec!["a.HTML", "b.log", "nested/c.txt"]);
    }

    #[test]
    fn test_find_replay_files_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(find_replay_files(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_resolve_sources_keeps_argument_order() {
        let tmp = TempDir::new().unwrap();
        let single = touch(tmp.path(), "single.dat", "");
        touch(tmp.path(), "dir/2.log", "");
        touch(tmp.path(), "dir/1.log", "");

        let sources =
            resolve_sources(&[single.clone(), tmp.path().join("dir")]).unwrap();
        let paths: Vec<&Path> = sources.iter().map(|s| s.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                single.as_path(),
                tmp.path().join("dir/1.log").as_path(),
                tmp.path().join("dir/2.log").as_path(),
            ]
        );
        assert_eq!(sources[0].link, single.display().to_string());
    }

    #[test]
    fn test_resolve_sources_empty_dir_errors() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("empty")).unwrap();
        let err = resolve_sources(&[tmp.path().join("empty")]).unwrap_err();
        assert!(matches!(err, ScoutError::NoSources(_)));
    }

    #[test]
    fn test_resolve_sources_missing_path_errors() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_sources(&[tmp.path().join("ghost.log")]).unwrap_err();
        assert!(matches!(err, ScoutError::SourceNotFound(_)));
    }

    #[test]
    fn test_read_replay_lossy_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.log");
        std::fs::write(&path, b"|tier|gen9ou\n|win|A\xff\n").unwrap();

        let text = read_replay(&path).unwrap();
        assert!(text.starts_with("|tier|gen9ou\n"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_replay_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_replay(&tmp.path().join("missing.log")).unwrap_err();
        assert!(matches!(err, ScoutError::FileRead { .. }));
    }

    #[test]
    fn test_apply_link_single_source() {
        let sources = apply_link(
            vec![ReplaySource::from_path("/tmp/r.log")],
            Some("https://replay.example/1"),
        )
        .unwrap();
        assert_eq!(sources[0].link, "https://replay.example/1");
    }

    #[test]
    fn test_apply_link_rejects_batches() {
        let sources = vec![
            ReplaySource::from_path("/tmp/a.log"),
            ReplaySource::from_path("/tmp/b.log"),
        ];
        assert!(matches!(
            apply_link(sources.clone(), Some("x")).unwrap_err(),
            ScoutError::Config(_)
        ));
        assert_eq!(apply_link(sources.clone(), None).unwrap(), sources);
    }

    #[test]
    fn test_with_link_overrides_path() {
        let source = ReplaySource::from_path("/tmp/r.log").with_link("https://replay.example/1");
        assert_eq!(source.link, "https://replay.example/1");
    }
}
