// Precomputed season stat tables loaded from local CSV files.

pub mod handedness;
pub mod tables;

pub use handedness::{HandednessTable, Side};
pub use tables::{BattedBallRow, ExitBatterRow, ExitPitcherRow, ExpectedRow, KeyedTable};

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::DataPaths;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: String },
}

/// Every table the matchup join reads.
#[derive(Debug, Clone, Default)]
pub struct StatTables {
    pub exit_batters: KeyedTable<ExitBatterRow>,
    pub expected_batters: KeyedTable<ExpectedRow>,
    pub batted_ball: KeyedTable<BattedBallRow>,
    pub exit_pitchers: KeyedTable<ExitPitcherRow>,
    pub expected_pitchers: KeyedTable<ExpectedRow>,
    pub handedness: HandednessTable,
}

fn open(path: &Path) -> Result<File, StatsError> {
    File::open(path).map_err(|e| StatsError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn load_path<T>(
    path: &Path,
    load: impl FnOnce(File, &str) -> Result<T, StatsError>,
) -> Result<T, StatsError> {
    let file = open(path)?;
    load(file, &path.display().to_string())
}

impl StatTables {
    /// Load all tables from the configured paths. The handedness file is
    /// optional; every other file must exist.
    pub fn load(paths: &DataPaths) -> Result<Self, StatsError> {
        let exit_batters = load_path(Path::new(&paths.exit_batters), tables::load_exit_batters)?;
        let expected_batters = load_path(Path::new(&paths.expected_batters), tables::load_expected)?;
        let batted_ball = load_path(Path::new(&paths.batted_ball), tables::load_batted_ball)?;
        let exit_pitchers = load_path(Path::new(&paths.exit_pitchers), tables::load_exit_pitchers)?;
        let expected_pitchers = load_path(Path::new(&paths.expected_pitchers), tables::load_expected)?;

        let handedness_path = Path::new(&paths.handedness);
        let handedness = if handedness_path.exists() {
            load_path(handedness_path, handedness::load_handedness)?
        } else {
            warn!(
                "handedness file {} not found; every batter is treated as right-handed",
                handedness_path.display()
            );
            HandednessTable::default()
        };

        info!(
            exit_batters = exit_batters.len(),
            expected_batters = expected_batters.len(),
            batted_ball = batted_ball.len(),
            exit_pitchers = exit_pitchers.len(),
            expected_pitchers = expected_pitchers.len(),
            handedness = handedness.len(),
            "stat tables loaded"
        );

        Ok(Self {
            exit_batters,
            expected_batters,
            batted_ball,
            exit_pitchers,
            expected_pitchers,
            handedness,
        })
    }

    /// Build tables from readers. Log and error messages name each table
    /// instead of a path.
    pub fn from_readers<R: Read>(
        exit_batters: R,
        expected_batters: R,
        batted_ball: R,
        exit_pitchers: R,
        expected_pitchers: R,
        handedness: R,
    ) -> Result<Self, StatsError> {
        Ok(Self {
            exit_batters: tables::load_exit_batters(exit_batters, "exit_batters")?,
            expected_batters: tables::load_expected(expected_batters, "expected_batters")?,
            batted_ball: tables::load_batted_ball(batted_ball, "batted_ball")?,
            exit_pitchers: tables::load_exit_pitchers(exit_pitchers, "exit_pitchers")?,
            expected_pitchers: tables::load_expected(expected_pitchers, "expected_pitchers")?,
            handedness: handedness::load_handedness(handedness, "handedness")?,
        })
    }
}
