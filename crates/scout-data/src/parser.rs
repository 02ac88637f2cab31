//! Battle log → [`ReplayInfo`] reconstruction.
//!
//! The parser never fails: records it cannot use are skipped, and facts that
//! never appear in the log stay `None` on the result.

use std::collections::HashMap;

use scout_core::models::{ReplayInfo, Side, UNKNOWN};
use tracing::debug;

use crate::protocol::{self, Event};

/// Parse a complete battle log.
///
/// Players are taken from the page title only. Then every protocol line is
/// applied in order.
pub fn parse(text: &str) -> ReplayInfo {
    let mut state = ParseState::new();

    if let Some((p1, p2)) = protocol::title_players(text) {
        state.info.players.insert(Side::P1, p1);
        state.info.players.insert(Side::P2, p2);
    }

    let mut applied = 0usize;
    for event in protocol::events(text) {
        state.apply(event);
        applied += 1;
    }

    debug!(
        "Parsed replay: {} events, {} bindings, format {}",
        applied,
        state.bindings.len(),
        state.info.format_or_unknown(),
    );

    state.info
}

// ── Parse state ───────────────────────────────────────────────────────────────

/// Who an identifier currently refers to.
struct Binding<'a> {
    /// Display name of the owning side, or its raw two-character tag when the
    /// side had no name at binding time.
    owner: String,
    species: &'a str,
}

/// Working state for one `parse` call. Bindings never outlive it.
struct ParseState<'a> {
    info: ReplayInfo,
    bindings: HashMap<&'a str, Binding<'a>>,
}

impl<'a> ParseState<'a> {
    fn new() -> Self {
        Self {
            info: ReplayInfo::new(),
            bindings: HashMap::new(),
        }
    }

    fn apply(&mut self, event: Event<'a>) {
        match event {
            Event::Poke { side, species } => {
                self.info.team_mut(side).declare(species);
            }
            Event::Switch { ident, species } => {
                let tag = protocol::side_prefix(ident);
                let owner = Side::from_tag(tag)
                    .and_then(|side| self.info.player(side))
                    .unwrap_or(tag)
                    .to_string();
                self.bindings.insert(ident, Binding { owner, species });
            }
            Event::Move { ident, name } => self.record_move(ident, name),
            Event::Tier(format) => {
                if self.info.format.is_none() {
                    self.info.format = Some(format.to_string());
                }
            }
            Event::Win(winner) => {
                if self.info.winner.is_none() {
                    self.info.winner = Some(winner.to_string());
                }
            }
        }
    }

    /// Credit `mv` to whoever `ident` is bound to.
    ///
    /// An unbound identifier is treated as a species name owned by
    /// `"Unknown"`. The owner resolves to p1 only on an exact match with p1's
    /// display name; everything else lands on p2.
    fn record_move(&mut self, ident: &'a str, mv: &str) {
        let (owner, species) = match self.bindings.get(ident) {
            Some(b) => (b.owner.as_str(), b.species),
            None => (UNKNOWN, ident),
        };

        let side = if self.info.player(Side::P1) == Some(owner) {
            Side::P1
        } else {
            Side::P2
        };

        if let Some(member) = self.info.team_mut(side).get_mut(species) {
            member.add_move(mv);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::models::MAX_MOVES;

    const TITLE: &str = "<title>[Gen 9] OU replay: A vs. B - Replays - Showdown</title>";

    fn log(lines: &[&str]) -> String {
        let mut text = String::from(TITLE);
        text.push('\n');
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    fn moves_of(info: &ReplayInfo, side: Side, species: &str) -> Vec<String> {
        info.team(side).get(species).expect("declared").moves.clone()
    }

    #[test]
    fn test_single_match_end_to_end() {
        let text = log(&[
            "|poke|p1|Pikachu, L50|",
            "|switch|p1a|Pikachu, L50|",
            "|move|p1a|Thunderbolt|",
            "|tier|gen9ou|",
            "|win|A|",
        ]);
        let info = parse(&text);

        assert_eq!(info.format.as_deref(), Some("gen9ou"));
        assert_eq!(info.player(Side::P1), Some("A"));
        assert_eq!(info.player(Side::P2), Some("B"));
        assert_eq!(info.players.len(), 2);
        assert_eq!(info.team(Side::P1).len(), 1);
        assert_eq!(moves_of(&info, Side::P1, "Pikachu"), vec!["Thunderbolt"]);
        assert!(info.team(Side::P2).is_empty());
        assert_eq!(info.winner.as_deref(), Some("A"));
    }

    #[test]
    fn test_unbound_move_without_matching_member_is_noop() {
        let text = log(&[
            "|poke|p1|Pikachu, L50|",
            "|poke|p2|Charizard, L50|",
            "|move|p9z: Ghost|Shadow Ball|",
        ]);
        let info = parse(&text);

        assert!(moves_of(&info, Side::P1, "Pikachu").is_empty());
        assert!(moves_of(&info, Side::P2, "Charizard").is_empty());
    }

    #[test]
    fn test_unbound_move_falls_back_to_p2_species() {
        // The raw identifier doubles as a species name on the default side.
        let text = log(&["|poke|p2|Ditto|", "|move|Ditto|Transform|"]);
        let info = parse(&text);

        assert_eq!(moves_of(&info, Side::P2, "Ditto"), vec!["Transform"]);
    }

    #[test]
    fn test_move_for_undeclared_member_is_dropped() {
        let text = log(&["|switch|p1a: Mew|Mew, L50|", "|move|p1a: Mew|Psychic|"]);
        let info = parse(&text);

        assert!(info.team(Side::P1).is_empty());
        assert!(info.team(Side::P2).is_empty());
    }

    #[test]
    fn test_move_set_caps_at_four() {
        let text = log(&[
            "|poke|p2|Garchomp, L50|",
            "|switch|p2a: Chomp|Garchomp, L50|",
            "|move|p2a: Chomp|Earthquake|",
            "|move|p2a: Chomp|Dragon Claw|",
            "|move|p2a: Chomp|Earthquake|",
            "|move|p2a: Chomp|Swords Dance|",
            "|move|p2a: Chomp|Protect|",
            "|move|p2a: Chomp|Stone Edge|",
            "|move|p2a: Chomp|Fire Fang|",
        ]);
        let info = parse(&text);

        let moves = moves_of(&info, Side::P2, "Garchomp");
        assert_eq!(moves.len(), MAX_MOVES);
        assert_eq!(
            moves,
            vec!["Earthquake", "Dragon Claw", "Swords Dance", "Protect"]
        );
    }

    #[test]
    fn test_first_tier_wins() {
        let text = log(&["|tier|gen9ou|", "|tier|gen9uu|"]);
        assert_eq!(parse(&text).format.as_deref(), Some("gen9ou"));
    }

    #[test]
    fn test_first_win_wins() {
        let text = log(&["|win|A|", "|win|B|"]);
        assert_eq!(parse(&text).winner.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_facts_stay_none() {
        let info = parse("|poke|p1|Pikachu|\n");
        assert!(info.format.is_none());
        assert!(info.winner.is_none());
        assert!(info.players.is_empty());
        assert_eq!(info.team(Side::P1).len(), 1);
    }

    #[test]
    fn test_player_records_do_not_name_sides() {
        let text = "|player|p1|Alice|1|\n\
                    |player|p2|Bob|2|\n\
                    |poke|p1|Pikachu|\n\
                    |poke|p2|Pikachu|\n\
                    |switch|p1a|Pikachu|\n\
                    |move|p1a|Thunderbolt|\n";
        let info = parse(text);

        assert!(info.players.is_empty());
        assert!(moves_of(&info, Side::P1, "Pikachu").is_empty());
        assert_eq!(moves_of(&info, Side::P2, "Pikachu"), vec!["Thunderbolt"]);
    }

    #[test]
    fn test_title_names_survive_player_records() {
        let text = log(&["|player|p1|Someone Else|", "|player|p2|Another|"]);
        let info = parse(&text);

        assert_eq!(info.player(Side::P1), Some("A"));
        assert_eq!(info.player(Side::P2), Some("B"));
    }

    #[test]
    fn test_unnamed_p1_moves_resolve_to_p2() {
        // With no display names the binding owner is the raw tag "p1", which
        // never equals an absent p1 name, so the move is looked up on p2.
        let text = "|poke|p1|Pikachu|\n\
                    |poke|p2|Pikachu|\n\
                    |switch|p1a|Pikachu|\n\
                    |move|p1a|Thunderbolt|\n";
        let info = parse(text);

        assert!(moves_of(&info, Side::P1, "Pikachu").is_empty());
        assert_eq!(moves_of(&info, Side::P2, "Pikachu"), vec!["Thunderbolt"]);
    }

    #[test]
    fn test_drag_rebinds_identifier() {
        let text = log(&[
            "|poke|p1|Pikachu|",
            "|poke|p1|Snorlax|",
            "|switch|p1a|Pikachu, L50|",
            "|drag|p1a|Snorlax, L50|",
            "|move|p1a|Body Slam|",
        ]);
        let info = parse(&text);

        assert!(moves_of(&info, Side::P1, "Pikachu").is_empty());
        assert_eq!(moves_of(&info, Side::P1, "Snorlax"), vec!["Body Slam"]);
    }

    #[test]
    fn test_repeated_poke_keeps_order_and_moves() {
        let text = log(&[
            "|poke|p1|Zapdos|",
            "|poke|p1|Mew|",
            "|switch|p1a|Zapdos|",
            "|move|p1a|Roost|",
            "|poke|p1|Zapdos|",
        ]);
        let info = parse(&text);

        let names: Vec<&str> = info.team(Side::P1).names().collect();
        assert_eq!(names, vec!["Zapdos", "Mew"]);
        assert_eq!(moves_of(&info, Side::P1, "Zapdos"), vec!["Roost"]);
    }

    #[test]
    fn test_noise_is_tolerated() {
        let text = log(&[
            "<html>",
            "|j|A",
            "|c|A|glhf",
            "|poke|p1",
            "|poke|p5|Mew|",
            "|move|",
            "||||",
            "|turn|1",
            "|poke|p1|Mew|",
        ]);
        let info = parse(&text);

        assert_eq!(info.team(Side::P1).len(), 1);
        assert!(info.team(Side::P2).is_empty());
    }

    #[test]
    fn test_parse_calls_do_not_share_bindings() {
        let first = log(&["|poke|p1|Pikachu|", "|switch|p1a|Pikachu|"]);
        let second = log(&["|poke|p1|Pikachu|", "|move|p1a|Thunderbolt|"]);
        parse(&first);
        let info = parse(&second);

        assert!(moves_of(&info, Side::P1, "Pikachu").is_empty());
    }
}
