// Batting-side table (Name, Side).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use tracing::{debug, warn};

use super::tables::require_column;
use super::StatsError;
use crate::names::handedness_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Switch,
}

impl Side {
    /// Accepts single letters and words, case-insensitively:
    /// L/Left, R/Right, S/B/Switch/Both.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Some(Side::Left),
            "r" | "right" => Some(Side::Right),
            "s" | "b" | "switch" | "both" => Some(Side::Switch),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "L",
            Side::Right => "R",
            Side::Switch => "S",
        })
    }
}

/// Player name -> batting side. Names absent from the table bat right.
#[derive(Debug, Clone, Default)]
pub struct HandednessTable {
    sides: HashMap<String, Side>,
}

impl HandednessTable {
    pub fn side_of(&self, name: &str) -> Side {
        self.sides
            .get(&handedness_key(name))
            .copied()
            .unwrap_or(Side::Right)
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }
}

impl FromIterator<(String, Side)> for HandednessTable {
    fn from_iter<I: IntoIterator<Item = (String, Side)>>(iter: I) -> Self {
        let mut sides = HashMap::new();
        for (name, side) in iter {
            sides.entry(handedness_key(&name)).or_insert(side);
        }
        Self { sides }
    }
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawHandedness {
    Name: String,
    Side: String,
}

pub fn load_handedness<R: Read>(rdr: R, origin: &str) -> Result<HandednessTable, StatsError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    require_column(&mut reader, "Name", origin)?;
    require_column(&mut reader, "Side", origin)?;

    let mut sides = HashMap::new();
    for result in reader.deserialize::<RawHandedness>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{origin}: skipping malformed row: {e}");
                continue;
            }
        };
        let key = handedness_key(&raw.Name);
        if key.is_empty() {
            continue;
        }
        let Some(side) = Side::parse(&raw.Side) else {
            warn!("{origin}: skipping '{}': unknown side '{}'", raw.Name, raw.Side);
            continue;
        };
        if sides.contains_key(&key) {
            debug!("{origin}: duplicate row for '{key}', keeping the first");
            continue;
        }
        sides.insert(key, side);
    }
    Ok(HandednessTable { sides })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_and_words() {
        assert_eq!(Side::parse("L"), Some(Side::Left));
        assert_eq!(Side::parse("right"), Some(Side::Right));
        assert_eq!(Side::parse(" Switch "), Some(Side::Switch));
        assert_eq!(Side::parse("B"), Some(Side::Switch));
        assert_eq!(Side::parse("X"), None);
    }

    #[test]
    fn lookup_ignores_case_and_defaults_right() {
        let csv_data = "\
Name,Side
Kyle Schwarber,L
Trea Turner,R
Ketel Marte,S";

        let table = load_handedness(csv_data.as_bytes(), "handedness").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.side_of(" kyle schwarber "), Side::Left);
        assert_eq!(table.side_of("Ketel Marte"), Side::Switch);
        assert_eq!(table.side_of("Unknown Player"), Side::Right);
    }

    #[test]
    fn unknown_sides_are_skipped() {
        let csv_data = "\
Name,Side
Some Player,?
Bryce Harper,Left";

        let table = load_handedness(csv_data.as_bytes(), "handedness").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.side_of("Some Player"), Side::Right);
        assert_eq!(table.side_of("Bryce Harper"), Side::Left);
    }

    #[test]
    fn wrong_header_is_missing_column() {
        let err = load_handedness("name,side\nKyle Schwarber,L\n".as_bytes(), "handedness").unwrap_err();
        assert!(matches!(
            err,
            StatsError::MissingColumn { ref column, .. } if column == "Name"
        ));

        let err = load_handedness("Name,Bats\nKyle Schwarber,L\n".as_bytes(), "handedness").unwrap_err();
        assert!(matches!(
            err,
            StatsError::MissingColumn { ref column, .. } if column == "Side"
        ));
    }
}
