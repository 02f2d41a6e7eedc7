// Savant-format stat table loading.
//
// Exit-velocity and expected-stats exports key rows by a quoted
// `last_name, first_name` column; the batted-ball export uses `name`.
// Every value cell is read as text and converted here, so an empty or
// garbage cell becomes `None` without discarding the rest of the row.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

use super::StatsError;
use crate::names::clean_name;

// ---------------------------------------------------------------------------
// Public row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitBatterRow {
    pub avg_hit_speed: Option<f64>,
    pub brl_percent: Option<f64>,
}

/// Expected-stats row. Shared by the batter and pitcher exports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpectedRow {
    pub est_slg: Option<f64>,
    pub est_woba: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BattedBallRow {
    pub pull_air_rate: Option<f64>,
    pub oppo_air_rate: Option<f64>,
    pub fb_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitPitcherRow {
    pub ev95percent: Option<f64>,
    pub brl_percent: Option<f64>,
}

/// Rows keyed by a normalized player name. The first row for a key wins.
#[derive(Debug, Clone)]
pub struct KeyedTable<T> {
    rows: HashMap<String, T>,
}

impl<T> Default for KeyedTable<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T> KeyedTable<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert unless the key is already present. Returns false for a
    /// duplicate.
    fn insert_first(&mut self, key: String, row: T) -> bool {
        match self.rows.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(row);
                true
            }
        }
    }
}

impl<T> FromIterator<(String, T)> for KeyedTable<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (key, row) in iter {
            table.insert_first(key, row);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawExitBatter {
    #[serde(rename = "last_name, first_name")]
    name: String,
    #[serde(default)]
    avg_hit_speed: String,
    #[serde(default)]
    brl_percent: String,
}

#[derive(Debug, Deserialize)]
struct RawExpected {
    #[serde(rename = "last_name, first_name")]
    name: String,
    #[serde(default)]
    est_slg: String,
    #[serde(default)]
    est_woba: String,
}

#[derive(Debug, Deserialize)]
struct RawBattedBall {
    name: String,
    #[serde(default)]
    pull_air_rate: String,
    #[serde(default)]
    oppo_air_rate: String,
    #[serde(default)]
    fb_rate: String,
}

#[derive(Debug, Deserialize)]
struct RawExitPitcher {
    #[serde(rename = "last_name, first_name")]
    name: String,
    #[serde(default)]
    ev95percent: String,
    #[serde(default)]
    brl_percent: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a numeric cell. Empty, non-numeric, and non-finite cells are `None`.
pub(crate) fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Key for tables whose name column is `last_name, first_name`.
fn savant_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(super) fn require_column<R: Read>(
    reader: &mut csv::Reader<R>,
    column: &str,
    origin: &str,
) -> Result<(), StatsError> {
    let headers = reader.headers().map_err(|e| StatsError::Csv {
        path: origin.to_string(),
        source: e,
    })?;
    if headers.iter().any(|h| h.trim() == column) {
        Ok(())
    } else {
        Err(StatsError::MissingColumn {
            path: origin.to_string(),
            column: column.to_string(),
        })
    }
}

/// Shared row loop: deserialize, skip malformed or unnamed rows, keep the
/// first row per key.
fn load_keyed<R, Raw, T>(
    rdr: R,
    origin: &str,
    key_column: &str,
    convert: impl Fn(Raw) -> (String, T),
) -> Result<KeyedTable<T>, StatsError>
where
    R: Read,
    Raw: serde::de::DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);
    require_column(&mut reader, key_column, origin)?;

    let mut table = KeyedTable::default();
    for result in reader.deserialize::<Raw>() {
        match result {
            Ok(raw) => {
                let (key, row) = convert(raw);
                if key.is_empty() {
                    warn!("{origin}: skipping row with empty name");
                    continue;
                }
                if !table.insert_first(key.clone(), row) {
                    debug!("{origin}: duplicate row for '{key}', keeping the first");
                }
            }
            Err(e) => {
                warn!("{origin}: skipping malformed row: {e}");
            }
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

pub fn load_exit_batters<R: Read>(rdr: R, origin: &str) -> Result<KeyedTable<ExitBatterRow>, StatsError> {
    load_keyed(rdr, origin, "last_name, first_name", |raw: RawExitBatter| {
        (
            savant_key(&raw.name),
            ExitBatterRow {
                avg_hit_speed: parse_value(&raw.avg_hit_speed),
                brl_percent: parse_value(&raw.brl_percent),
            },
        )
    })
}

pub fn load_expected<R: Read>(rdr: R, origin: &str) -> Result<KeyedTable<ExpectedRow>, StatsError> {
    load_keyed(rdr, origin, "last_name, first_name", |raw: RawExpected| {
        (
            savant_key(&raw.name),
            ExpectedRow {
                est_slg: parse_value(&raw.est_slg),
                est_woba: parse_value(&raw.est_woba),
            },
        )
    })
}

/// Batted-ball rows are keyed by the cleaned name (no punctuation).
pub fn load_batted_ball<R: Read>(rdr: R, origin: &str) -> Result<KeyedTable<BattedBallRow>, StatsError> {
    load_keyed(rdr, origin, "name", |raw: RawBattedBall| {
        (
            clean_name(&raw.name),
            BattedBallRow {
                pull_air_rate: parse_value(&raw.pull_air_rate),
                oppo_air_rate: parse_value(&raw.oppo_air_rate),
                fb_rate: parse_value(&raw.fb_rate),
            },
        )
    })
}

pub fn load_exit_pitchers<R: Read>(rdr: R, origin: &str) -> Result<KeyedTable<ExitPitcherRow>, StatsError> {
    load_keyed(rdr, origin, "last_name, first_name", |raw: RawExitPitcher| {
        (
            savant_key(&raw.name),
            ExitPitcherRow {
                ev95percent: parse_value(&raw.ev95percent),
                brl_percent: parse_value(&raw.brl_percent),
            },
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
