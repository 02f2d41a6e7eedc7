// Player-name normalization shared by the stat-table join.
//
// Lineups carry "First Last"; the Savant tables key rows by
// "Last, First" and the batted-ball export strips punctuation.

/// Drop every character that is neither a word character nor whitespace,
/// then lowercase and trim. "Acuña Jr., Ronald" -> "acuña jr ronald".
pub fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// "Elly De La Cruz" -> "De La Cruz, Elly". Returns `None` for names with
/// fewer than two whitespace-separated parts.
pub fn format_to_last_first(name: &str) -> Option<String> {
    let mut parts = name.split_whitespace();
    let first = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return None;
    }
    Some(format!("{}, {}", rest.join(" "), first))
}

/// Lookup key for tables keyed by the `last_name, first_name` column.
pub fn last_first_key(name: &str) -> Option<String> {
    format_to_last_first(name).map(|s| s.to_lowercase())
}

/// Lookup key for the handedness table, which stores full names.
pub fn handedness_key(name: &str) -> String {
    name.trim().to_lowercase()
}
