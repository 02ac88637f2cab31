//! Tokenizer for the pipe-delimited battle protocol.
//!
//! Each protocol line looks like `|kind|field|field|...`. Only the kinds the
//! parser acts on become an [`Event`]; every other line (chat, damage, turn
//! markers, HTML around the log, truncated records) tokenizes to `None`.

use std::sync::OnceLock;

use regex::Regex;
use scout_core::models::Side;

/// A protocol record the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// `|poke|p1|Species, L50|...` – team preview declaration.
    Poke { side: Side, species: &'a str },
    /// `|switch|…` and `|drag|…` – binds an identifier to a species.
    Switch { ident: &'a str, species: &'a str },
    /// `|move|ident|Move Name|...`
    Move { ident: &'a str, name: &'a str },
    /// `|tier|format`
    Tier(&'a str),
    /// `|win|Name`
    Win(&'a str),
}

/// Tokenize every line of `text`, dropping the ones that are not events.
pub fn events(text: &str) -> impl Iterator<Item = Event<'_>> {
    text.lines().filter_map(tokenize)
}

/// Tokenize a single line.
pub fn tokenize(line: &str) -> Option<Event<'_>> {
    let rest = line.strip_prefix('|')?;
    let mut fields = rest.split('|');
    let kind = fields.next()?;

    match kind {
        "poke" => {
            let side = Side::from_tag(fields.next()?)?;
            let species = species_name(fields.next()?);
            Some(Event::Poke { side, species })
        }
        "switch" | "drag" => {
            let ident = fields.next()?;
            let species = species_name(fields.next()?);
            Some(Event::Switch { ident, species })
        }
        "move" => {
            let ident = fields.next()?;
            let name = fields.next()?;
            Some(Event::Move { ident, name })
        }
        "tier" => fields.next().map(Event::Tier),
        "win" => fields.next().map(Event::Win),
        _ => None,
    }
}

/// The species part of a roster spec such as `"Pikachu, L50, F"`.
pub fn species_name(spec: &str) -> &str {
    spec.split(',').next().unwrap_or(spec)
}

/// The two-character side prefix of an identifier (`"p1a: Pikachu"` → `"p1"`).
///
/// Returns the whole identifier when it is shorter than two characters.
pub fn side_prefix(ident: &str) -> &str {
    match ident.char_indices().nth(2) {
        Some((idx, _)) => &ident[..idx],
        None => ident,
    }
}

/// Find the `"<p1> vs. <p2>"` pair in the replay page title, e.g.
/// `[Gen 9] OU replay: Alice vs. Bob - Replays - Showdown`.
pub fn title_players(text: &str) -> Option<(String, String)> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE.get_or_init(|| {
        Regex::new(r"\[.*\] .+: (.+?) vs\. (.+?) - Replays").expect("regex is valid")
    });

    let caps = re.captures(text)?;
    let p1 = caps.get(1)?.as_str().trim();
    let p2 = caps.get(2)?.as_str().trim();
    Some((p1.to_string(), p2.to_string()))
}
