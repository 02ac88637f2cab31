use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound on the number of distinct moves recorded per roster member.
pub const MAX_MOVES: usize = 4;

/// Placeholder shown wherever a player, format or winner was never observed.
pub const UNKNOWN: &str = "Unknown";

/// One of the two participants in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    /// Both sides, in presentation order.
    pub const ALL: [Side; 2] = [Side::P1, Side::P2];

    /// The protocol tag for this side (`"p1"` / `"p2"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::P1 => "p1",
            Side::P2 => "p2",
        }
    }

    /// Parse an exact side tag. Anything other than `p1`/`p2` is rejected.
    pub fn from_tag(tag: &str) -> Option<Side> {
        match tag {
            "p1" => Some(Side::P1),
            "p2" => Some(Side::P2),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rosters ────────────────────────────────────────────────────────────────────

/// A roster member and the moves it was seen using.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    /// Species name as declared by the `poke` event.
    pub name: String,
    /// Distinct move names in first-seen order, never more than [`MAX_MOVES`].
    pub moves: Vec<String>,
}

impl RosterMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            moves: Vec::new(),
        }
    }

    /// Record `mv` unless the set is already full or already holds it.
    ///
    /// Returns `true` when the move set changed.
    pub fn add_move(&mut self, mv: &str) -> bool {
        if self.moves.len() >= MAX_MOVES || self.moves.iter().any(|m| m == mv) {
            return false;
        }
        self.moves.push(mv.to_string());
        true
    }

    /// The move list padded with empty strings to exactly [`MAX_MOVES`] slots.
    pub fn padded_moves(&self) -> [String; MAX_MOVES] {
        std::array::from_fn(|i| self.moves.get(i).cloned().unwrap_or_default())
    }
}

/// One side's roster, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team {
    members: Vec<RosterMember>,
}

impl Team {
    /// Declare `name` with an empty move set.
    ///
    /// Returns `false` (and leaves the existing member untouched) when the
    /// member was already declared.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.members.push(RosterMember::new(name));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RosterMember> {
        self.members.iter_mut().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterMember> {
        self.members.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ── ReplayInfo ─────────────────────────────────────────────────────────────────

/// Structured data reconstructed from a single battle log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayInfo {
    /// Ruleset tag from the first `tier` event.
    pub format: Option<String>,
    /// Display name per side. At most one entry per [`Side`].
    pub players: BTreeMap<Side, String>,
    /// Roster per side. Both sides are always present.
    pub teams: BTreeMap<Side, Team>,
    /// Display name from the first `win` event.
    pub winner: Option<String>,
}

impl Default for ReplayInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayInfo {
    /// An empty result with both teams present.
    pub fn new() -> Self {
        Self {
            format: None,
            players: BTreeMap::new(),
            teams: Side::ALL.iter().map(|s| (*s, Team::default())).collect(),
            winner: None,
        }
    }

    pub fn player(&self, side: Side) -> Option<&str> {
        self.players.get(&side).map(String::as_str)
    }

    /// Display name for `side`, or [`UNKNOWN`].
    pub fn player_or_unknown(&self, side: Side) -> &str {
        self.player(side).unwrap_or(UNKNOWN)
    }

    pub fn team(&self, side: Side) -> &Team {
        // Both keys are inserted by `new`; the fallback only covers values
        // deserialized from an incomplete document.
        static EMPTY: Team = Team {
            members: Vec::new(),
        };
        self.teams.get(&side).unwrap_or(&EMPTY)
    }

    pub fn team_mut(&mut self, side: Side) -> &mut Team {
        self.teams.entry(side).or_default()
    }

    pub fn format_or_unknown(&self) -> &str {
        self.format.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn winner_or_unknown(&self) -> &str {
        self.winner.as_deref().unwrap_or(UNKNOWN)
    }
}

// ── Usage ──────────────────────────────────────────────────────────────────────

/// One row of the cross-match usage table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub name: String,
    /// Cumulative appearances across all aggregated matches.
    pub count: u32,
    /// `count / (2 * total_matches) * 100`; re-derived on every merge.
    #[serde(default, deserialize_with = "crate::formatting::deserialize_percentage")]
    pub percentage: f64,
}

impl UsageRecord {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            percentage: 0.0,
        }
    }
}

/// Usage records keyed by name, kept in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<UsageRecord>", into = "Vec<UsageRecord>")]
pub struct FrequencyTable {
    records: Vec<UsageRecord>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows, folding duplicate names into the first
    /// occurrence.
    pub fn from_records(rows: impl IntoIterator<Item = UsageRecord>) -> Self {
        let mut table = Self::new();
        for row in rows {
            match table.get_mut(&row.name) {
                Some(existing) => existing.count = existing.count.saturating_add(row.count),
                None => table.records.push(row),
            }
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&UsageRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UsageRecord> {
        self.records.iter_mut().find(|r| r.name == name)
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<UsageRecord> {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &UsageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all counts; equals the number of roster slots aggregated.
    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.count)).sum()
    }
}

impl From<Vec<UsageRecord>> for FrequencyTable {
    fn from(rows: Vec<UsageRecord>) -> Self {
        Self::from_records(rows)
    }
}

impl From<FrequencyTable> for Vec<UsageRecord> {
    fn from(table: FrequencyTable) -> Self {
        table.records
    }
}

/// Per-match roster counts, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCounts {
    entries: Vec<(String, u32)>,
}

impl MatchCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` appearances for `name`.
    pub fn add(&mut self, name: &str, n: u32) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, count)) => *count = count.saturating_add(n),
            None => self.entries.push((name.to_string(), n)),
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, u32)> for MatchCounts {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut counts = MatchCounts::new();
        for (name, n) in iter {
            counts.add(name.as_ref(), n);
        }
        counts
    }
}

// ── Persisted rows ─────────────────────────────────────────────────────────────

/// One row of the matches table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `"Match N"`, N being the 1-based position in the table.
    pub match_id: String,
    pub format: Option<String>,
    /// Where the replay came from (URL or file path).
    pub link: String,
    /// Local time the match was recorded, `%Y-%m-%d %H:%M:%S`.
    pub date: String,
    pub player1: String,
    pub player2: String,
    pub winner: Option<String>,
}

/// One roster member line of the teams & moves table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRow {
    pub match_id: String,
    pub player: String,
    pub pokemon: String,
    pub moves: [String; MAX_MOVES],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_tags() {
        assert_eq!(Side::from_tag("p1"), Some(Side::P1));
        assert_eq!(Side::from_tag("p2"), Some(Side::P2));
        assert_eq!(Side::from_tag("p3"), None);
        assert_eq!(Side::from_tag("P1"), None);
        assert_eq!(Side::P2.to_string(), "p2");
    }

    #[test]
    fn test_add_move_caps_at_four() {
        let mut m = RosterMember::new("Pikachu");
        for mv in ["Thunderbolt", "Volt Tackle", "Surf", "Fake Out", "Protect"] {
            m.add_move(mv);
        }
        assert_eq!(m.moves.len(), MAX_MOVES);
        assert!(!m.moves.contains(&"Protect".to_string()));
    }

    #[test]
    fn test_add_move_ignores_duplicates() {
        let mut m = RosterMember::new("Pikachu");
        assert!(m.add_move("Thunderbolt"));
        assert!(!m.add_move("Thunderbolt"));
        assert_eq!(m.moves, vec!["Thunderbolt".to_string()]);
    }

    #[test]
    fn test_padded_moves() {
        let mut m = RosterMember::new("Garchomp");
        m.add_move("Earthquake");
        m.add_move("Dragon Claw");
        let padded = m.padded_moves();
        assert_eq!(padded[0], "Earthquake");
        assert_eq!(padded[1], "Dragon Claw");
        assert_eq!(padded[2], "");
        assert_eq!(padded[3], "");
    }

    #[test]
    fn test_team_declare_is_idempotent() {
        let mut team = Team::default();
        assert!(team.declare("Pikachu"));
        team.get_mut("Pikachu").unwrap().add_move("Surf");
        assert!(!team.declare("Pikachu"));
        assert_eq!(team.len(), 1);
        assert_eq!(team.get("Pikachu").unwrap().moves, vec!["Surf".to_string()]);
    }

    #[test]
    fn test_team_keeps_declaration_order() {
        let mut team = Team::default();
        team.declare("Zapdos");
        team.declare("Abomasnow");
        team.declare("Mew");
        let names: Vec<&str> = team.names().collect();
        assert_eq!(names, vec!["Zapdos", "Abomasnow", "Mew"]);
    }

    #[test]
    fn test_replay_info_new_has_both_teams() {
        let info = ReplayInfo::new();
        assert_eq!(info.teams.len(), 2);
        assert!(info.team(Side::P1).is_empty());
        assert!(info.team(Side::P2).is_empty());
        assert_eq!(info.player_or_unknown(Side::P1), UNKNOWN);
        assert_eq!(info.format_or_unknown(), UNKNOWN);
        assert_eq!(info.winner_or_unknown(), UNKNOWN);
    }

    #[test]
    fn test_frequency_table_folds_duplicates() {
        let table = FrequencyTable::from_records(vec![
            UsageRecord::new("Pikachu", 2),
            UsageRecord::new("Charizard", 1),
            UsageRecord::new("Pikachu", 3),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Pikachu").unwrap().count, 5);
        assert_eq!(table.records()[1].name, "Charizard");
        assert_eq!(table.total_count(), 6);
    }

    #[test]
    fn test_frequency_table_fold_saturates() {
        let table = FrequencyTable::from_records(vec![
            UsageRecord::new("Mew", u32::MAX),
            UsageRecord::new("Mew", 1),
        ]);
        assert_eq!(table.get("Mew").unwrap().count, u32::MAX);
    }

    #[test]
    fn test_frequency_table_serializes_as_row_list() {
        let mut table = FrequencyTable::from_records(vec![UsageRecord::new("Mew", 1)]);
        table.get_mut("Mew").unwrap().percentage = 50.0;
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "name": "Mew", "count": 1, "percentage": 50.0 }])
        );
    }

    #[test]
    fn test_match_counts_accumulates_in_order() {
        let mut counts = MatchCounts::new();
        counts.add("Pikachu", 1);
        counts.add("Charizard", 1);
        counts.add("Pikachu", 1);
        let collected: Vec<(&str, u32)> = counts.iter().collect();
        assert_eq!(collected, vec![("Pikachu", 2), ("Charizard", 1)]);
        assert_eq!(counts.get("Mew"), None);
    }
}
