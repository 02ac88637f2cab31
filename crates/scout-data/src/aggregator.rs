//! Cross-match usage aggregation.
//!
//! Each match contributes two rosters, so a record's percentage is its count
//! over `2 × total_matches`. Percentages are re-derived for the whole table on
//! every merge rather than adjusted incrementally.

use std::collections::HashMap;

use scout_core::error::{Result, ScoutError};
use scout_core::models::{FrequencyTable, MatchCounts, ReplayInfo, Side, UsageRecord};

/// Roster slots contributed by one match.
pub const ROSTERS_PER_MATCH: u64 = 2;

/// Stateless helper that folds per-match roster counts into a usage table.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Count roster appearances in one parsed match: p1's roster, then p2's,
    /// each declared member counting once per side it appears on.
    pub fn count_roster(info: &ReplayInfo) -> MatchCounts {
        let mut counts = MatchCounts::new();
        for side in Side::ALL {
            for name in info.team(side).names() {
                counts.add(name, 1);
            }
        }
        counts
    }

    /// Merge `counts` into `existing` and return the re-derived table.
    ///
    /// New names are appended in the order `counts` yields them, then the
    /// table is stably sorted by percentage, highest first.
    ///
    /// Fails with [`ScoutError::DegenerateInput`] when `total_matches` is 0
    /// or a count would overflow.
    pub fn merge(
        existing: FrequencyTable,
        counts: &MatchCounts,
        total_matches: u64,
    ) -> Result<FrequencyTable> {
        if total_matches == 0 {
            return Err(ScoutError::DegenerateInput(
                "usage merge needs at least one recorded match".to_string(),
            ));
        }

        let mut table = existing;
        let records = table.records_mut();

        let mut index: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();

        for (name, count) in counts.iter() {
            match index.get(name) {
                Some(&i) => {
                    records[i].count = records[i].count.checked_add(count).ok_or_else(|| {
                        ScoutError::DegenerateInput(format!("usage count for {name} overflows"))
                    })?;
                }
                None => {
                    index.insert(name.to_string(), records.len());
                    records.push(UsageRecord::new(name, count));
                }
            }
        }

        let slots = (ROSTERS_PER_MATCH * total_matches) as f64;
        for record in records.iter_mut() {
            record.percentage = f64::from(record.count) / slots * 100.0;
        }

        // `sort_by` is stable, so ties keep their prior relative order.
        records.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        Ok(table)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
