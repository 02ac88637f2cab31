use serde::{Deserialize, Deserializer};

/// Format a usage percentage with two decimals and a trailing `%`.
///
/// # Examples
///
/// ```
/// use scout_core::formatting::format_percentage;
///
/// assert_eq!(format_percentage(50.0), "50.00%");
/// assert_eq!(format_percentage(33.333_333), "33.33%");
/// assert_eq!(format_percentage(0.0), "0.00%");
/// ```
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Parse a percentage cell such as `"12.50%"` or `"12.5"`.
///
/// Returns `None` for anything that is not a finite number once the optional
/// `%` suffix and surrounding whitespace are removed.
///
/// # Examples
///
/// ```
/// use scout_core::formatting::parse_percentage;
///
/// assert_eq!(parse_percentage("12.50%"), Some(12.5));
/// assert_eq!(parse_percentage(" 7 "), Some(7.0));
/// assert_eq!(parse_percentage("n/a"), None);
/// ```
pub fn parse_percentage(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Deserialize a stored percentage written either as a number or as text
/// (`"50.00%"`). Unparseable text becomes `0.0`; the value is re-derived on
/// the next merge anyway.
pub fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Number(f64),
        Text(String),
    }

    Ok(match Cell::deserialize(deserializer)? {
        Cell::Number(v) => v,
        Cell::Text(s) => parse_percentage(&s).unwrap_or(0.0),
    })
}

/// Label used for the match with 1-based position `n`.
///
/// # Examples
///
/// ```
/// use scout_core::formatting::match_label;
///
/// assert_eq!(match_label(3), "Match 3");
/// ```
pub fn match_label(n: usize) -> String {
    format!("Match {}", n)
}

/// Left-align `text` in a column of `width` characters, cutting it with an
/// ellipsis when it does not fit.
pub fn fit_column(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{:<width$}", text, width = width);
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}
