//! Plain-text tables printed after an ingest run.

use scout_core::formatting::{fit_column, format_percentage};
use scout_core::models::{FrequencyTable, MatchRecord, TeamRow, UNKNOWN};
use scout_runtime::orchestrator::IngestReport;

const NAME_WIDTH: usize = 20;
const PLAYER_WIDTH: usize = 18;
const MOVE_WIDTH: usize = 16;

/// One line per source plus a summary line.
pub fn render_ingest(report: &IngestReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(record) => out.push_str(&format!(
                "ok    {}  {} vs. {}  ({})\n",
                record.match_id, record.player1, record.player2, outcome.source.link
            )),
            Err(e) => out.push_str(&format!("error {}: {}\n", outcome.source.link, e)),
        }
    }
    out.push_str(&format!(
        "{} recorded, {} failed\n",
        report.recorded(),
        report.failed()
    ));
    out
}

/// Usage table, optionally limited to the first `top` rows.
pub fn render_usage(usage: &FrequencyTable, top: Option<usize>) -> String {
    let mut out = format!(
        "{} {:>11} {:>16}\n",
        fit_column("Pokemon", NAME_WIDTH),
        "Total Usage",
        "Usage Percentage"
    );
    let limit = top.unwrap_or(usage.len());
    for record in usage.iter().take(limit) {
        out.push_str(&format!(
            "{} {:>11} {:>16}\n",
            fit_column(&record.name, NAME_WIDTH),
            record.count,
            format_percentage(record.percentage)
        ));
    }
    out
}

pub fn render_matches(matches: &[MatchRecord]) -> String {
    let mut out = format!(
        "{:<10} {:<14} {:<19} {} {} {}\n",
        "Match ID",
        "Format",
        "Date",
        fit_column("Player 1", PLAYER_WIDTH),
        fit_column("Player 2", PLAYER_WIDTH),
        "Winner"
    );
    for m in matches {
        out.push_str(&format!(
            "{:<10} {:<14} {:<19} {} {} {}\n",
            m.match_id,
            m.format.as_deref().unwrap_or(UNKNOWN),
            m.date,
            fit_column(&m.player1, PLAYER_WIDTH),
            fit_column(&m.player2, PLAYER_WIDTH),
            m.winner.as_deref().unwrap_or(UNKNOWN)
        ));
    }
    out
}

/// Teams & moves, with a header line each time the match or player changes.
pub fn render_teams(rows: &[TeamRow]) -> String {
    let mut out = String::new();
    let mut current: Option<(&str, &str)> = None;

    for row in rows {
        let key = (row.match_id.as_str(), row.player.as_str());
        if current.map(|(m, _)| m) != Some(key.0) {
            out.push_str(&format!("== {} ==\n", row.match_id));
        }
        if current != Some(key) {
            out.push_str(&format!("  {}\n", row.player));
        }
        current = Some(key);

        let moves: Vec<String> = row
            .moves
            .iter()
            .map(|mv| fit_column(mv, MOVE_WIDTH))
            .collect();
        out.push_str(&format!(
            "    {} {}\n",
            fit_column(&row.pokemon, NAME_WIDTH),
            moves.join(" ").trim_end()
        ));
    }
    out
}
