//! Persisted match, team and usage tables.
//!
//! The workbook is a single JSON document read fully before an update and
//! written fully after it. Updates are read-modify-write, so only one writer
//! may hold a workbook at a time.

use std::path::Path;

use chrono::Local;
use scout_core::error::{Result, ScoutError};
use scout_core::formatting::match_label;
use scout_core::models::{FrequencyTable, MatchRecord, ReplayInfo, Side, TeamRow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::UsageAggregator;

/// Timestamp format used for the matches table.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The three persisted tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
    #[serde(default)]
    pub teams: Vec<TeamRow>,
    #[serde(default)]
    pub usage: FrequencyTable,
}

impl Workbook {
    /// Load the workbook at `path`. A missing file yields an empty workbook.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No workbook at {}; starting empty", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ScoutError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let workbook: Workbook = serde_json::from_str(&content)?;

        debug!(
            "Loaded workbook {}: {} matches, {} usage rows",
            path.display(),
            workbook.matches.len(),
            workbook.usage.len()
        );
        Ok(workbook)
    }

    /// Atomically write the workbook, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Number of matches recorded so far.
    pub fn total_matches(&self) -> u64 {
        self.matches.len() as u64
    }

    /// Append one parsed match to all three tables, stamped with the current
    /// local time.
    pub fn record_match(&mut self, info: &ReplayInfo, link: &str) -> Result<&MatchRecord> {
        let date = Local::now().format(DATE_FORMAT).to_string();
        self.record_match_at(info, link, &date)
    }

    /// Same as [`Workbook::record_match`] with an explicit timestamp.
    ///
    /// Usage is merged before any row is appended, so a failed merge leaves
    /// the workbook untouched.
    pub fn record_match_at(
        &mut self,
        info: &ReplayInfo,
        link: &str,
        date: &str,
    ) -> Result<&MatchRecord> {
        let total = self.total_matches() + 1;
        let counts = UsageAggregator::count_roster(info);
        let usage = UsageAggregator::merge(self.usage.clone(), &counts, total)?;

        let match_id = match_label(self.matches.len() + 1);

        for side in Side::ALL {
            let player = info.player_or_unknown(side);
            for member in info.team(side).iter() {
                self.teams.push(TeamRow {
                    match_id: match_id.clone(),
                    player: player.to_string(),
                    pokemon: member.name.clone(),
                    moves: member.padded_moves(),
                });
            }
        }

        self.usage = usage;
        self.matches.push(MatchRecord {
            match_id,
            format: info.format.clone(),
            link: link.to_string(),
            date: date.to_string(),
            player1: info.player_or_unknown(Side::P1).to_string(),
            player2: info.player_or_unknown(Side::P2).to_string(),
            winner: info.winner.clone(),
        });

        Ok(&self.matches[self.matches.len() - 1])
    }

    /// Team rows belonging to `match_id`, in the order they were recorded.
    pub fn team_rows<'a>(&'a self, match_id: &'a str) -> impl Iterator<Item = &'a TeamRow> + 'a {
        self.teams.iter().filter(move |row| row.match_id == match_id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
