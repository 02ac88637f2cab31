//! Async ingest orchestrator.
//!
//! Reads and parses replay sources concurrently on blocking tasks and funnels
//! the results through an `mpsc` channel to a single writer task that owns the
//! [`Workbook`]. Parsing is side-effect free; the workbook update is a
//! read-modify-write, so the writer is the only place it happens.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use scout_core::error::{Result, ScoutError};
use scout_core::models::{MatchRecord, ReplayInfo};
use scout_data::parser;
use scout_data::reader::{self, ReplaySource};
use scout_data::workbook::Workbook;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Default number of sources read and parsed at the same time.
pub const DEFAULT_PARALLELISM: usize = 4;

// ── Public types ──────────────────────────────────────────────────────────────

/// What happened to one source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: ReplaySource,
    /// The recorded match row, or why the source was skipped.
    pub result: Result<MatchRecord>,
}

/// Result of one ingest run, outcomes in source order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl IngestReport {
    pub fn recorded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.recorded()
    }
}

// ── IngestOrchestrator ────────────────────────────────────────────────────────

/// Batch ingestion coordinator bound to one workbook file.
pub struct IngestOrchestrator {
    workbook_path: PathBuf,
    parallelism: usize,
}

impl IngestOrchestrator {
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    /// Limit concurrent read+parse tasks. Values below 1 are raised to 1.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Ingest `sources` and persist the workbook.
    ///
    /// Matches are recorded in source order regardless of which parse
    /// finishes first, so match numbering is deterministic. A source that
    /// cannot be read is reported in the outcome and does not stop the batch.
    /// The workbook is written once, after the last match, when at least one
    /// match was recorded.
    pub async fn run(&self, sources: Vec<ReplaySource>) -> Result<(Workbook, IngestReport)> {
        let path = self.workbook_path.clone();
        let workbook = tokio::task::spawn_blocking(move || Workbook::load(&path))
            .await
            .map_err(join_error)??;

        let (tx, rx) = mpsc::channel(self.parallelism * 2);
        let writer = tokio::spawn(write_loop(workbook, rx, sources.clone()));

        let permits = Arc::new(Semaphore::new(self.parallelism));
        let mut parsers = JoinSet::new();

        for (idx, source) in sources.into_iter().enumerate() {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ScoutError::Other(e.into()))?;
            let tx = tx.clone();

            parsers.spawn(async move {
                let path = source.path.clone();
                let parsed = tokio::task::spawn_blocking(move || {
                    reader::read_replay(&path).map(|text| parser::parse(&text))
                })
                .await
                .map_err(join_error)
                .and_then(|r| r);
                drop(permit);

                if tx.send((idx, parsed)).await.is_err() {
                    tracing::warn!("writer stopped before {} was recorded", source.link);
                }
            });
        }
        drop(tx);

        while let Some(joined) = parsers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "parse task failed");
            }
        }

        let (workbook, report) = writer.await.map_err(join_error)?;

        if report.recorded() > 0 {
            let path = self.workbook_path.clone();
            let to_save = workbook.clone();
            tokio::task::spawn_blocking(move || to_save.save(&path))
                .await
                .map_err(join_error)??;
            tracing::info!(
                "Saved workbook {} ({} matches)",
                self.workbook_path.display(),
                workbook.total_matches()
            );
        }

        Ok((workbook, report))
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

type Parsed = (usize, Result<ReplayInfo>);

/// Sole owner of the workbook during a run. Buffers early arrivals so matches
/// are applied in source order.
async fn write_loop(
    mut workbook: Workbook,
    mut rx: mpsc::Receiver<Parsed>,
    sources: Vec<ReplaySource>,
) -> (Workbook, IngestReport) {
    let mut pending: BTreeMap<usize, Result<ReplayInfo>> = BTreeMap::new();
    let mut results: Vec<Option<Result<MatchRecord>>> = sources.iter().map(|_| None).collect();
    let mut next = 0usize;

    while let Some((idx, parsed)) = rx.recv().await {
        pending.insert(idx, parsed);

        while let Some(parsed) = pending.remove(&next) {
            results[next] = Some(apply(&mut workbook, &sources[next], parsed));
            next += 1;
        }
    }

    // A lost task leaves a gap; record whatever arrived after it, still in order.
    for (idx, parsed) in pending {
        results[idx] = Some(apply(&mut workbook, &sources[idx], parsed));
    }

    // Sources whose task never reported (panicked or aborted).
    let outcomes = sources
        .into_iter()
        .zip(results)
        .map(|(source, result)| SourceOutcome {
            result: result.unwrap_or_else(|| {
                Err(ScoutError::Interrupted(format!(
                    "{} was not processed",
                    source.link
                )))
            }),
            source,
        })
        .collect();

    (workbook, IngestReport { outcomes })
}

fn apply(
    workbook: &mut Workbook,
    source: &ReplaySource,
    parsed: Result<ReplayInfo>,
) -> Result<MatchRecord> {
    let outcome = parsed.and_then(|info| workbook.record_match(&info, &source.link).cloned());
    match &outcome {
        Ok(record) => tracing::debug!("{} <- {}", record.match_id, source.link),
        Err(e) => tracing::warn!("Skipping {}: {}", source.link, e),
    }
    outcome
}

fn join_error(e: tokio::task::JoinError) -> ScoutError {
    ScoutError::Other(e.into())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
