// Matchup report pipeline: resolve teams, pull lineups, join stats.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Fallbacks;
use crate::join::{batter_stats, pitcher_stats, BatterStats, PitcherStats};
use crate::lineup::{find_lineups, GameFeed, LineupOptions, TeamLineup};
use crate::scoring::{rank, RankedHitter, WeightSet};
use crate::stats::{HandednessTable, StatTables};
use crate::teams::{self, TeamError};

#[derive(Debug, thiserror::Error)]
pub enum MatchupError {
    #[error(transparent)]
    Team(#[from] TeamError),

    #[error("Either no {team1} vs {team2} game today, or lineups not yet posted.")]
    NoGame { team1: String, team2: String },

    #[error("failed to fetch lineups: {0:#}")]
    Feed(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupReport {
    pub date: NaiveDate,
    pub game_pk: u64,
    pub away: TeamLineup,
    pub home: TeamLineup,
    pub batters: Vec<BatterStats>,
    pub pitchers: Vec<PitcherStats>,
    /// The game is on the schedule but no batting orders are posted yet.
    pub empty_lineups: bool,
}

impl MatchupReport {
    pub fn rank(&self, handedness: &HandednessTable, weights: &WeightSet) -> Vec<RankedHitter> {
        rank(&self.batters, handedness, weights)
    }

    /// "COL @ PHI" style label for logs and the run history.
    pub fn label(&self) -> String {
        let abbr = |name: &str| {
            teams::by_api_name(name)
                .map(|t| t.abbr.to_string())
                .unwrap_or_else(|| name.to_string())
        };
        format!("{} @ {}", abbr(&self.away.team_name), abbr(&self.home.team_name))
    }
}

/// Build the joined report for `team1` vs `team2` on `date`.
pub async fn build_report(
    feed: &dyn GameFeed,
    tables: &StatTables,
    fallbacks: &Fallbacks,
    team1: &str,
    team2: &str,
    date: NaiveDate,
    opts: LineupOptions,
) -> Result<MatchupReport, MatchupError> {
    let t1 = teams::lookup(team1)?;
    let t2 = teams::lookup(team2)?;

    let lineups = find_lineups(feed, t1, t2, date, opts)
        .await
        .map_err(MatchupError::Feed)?
        .ok_or_else(|| MatchupError::NoGame {
            team1: t1.abbr.to_string(),
            team2: t2.abbr.to_string(),
        })?;

    let empty_lineups = !lineups.has_lineups();
    if empty_lineups {
        warn!("{t1} vs {t2}: game found but lineups are not posted yet");
    }

    let batters: Vec<BatterStats> = lineups
        .batters()
        .iter()
        .map(|name| batter_stats(name, tables, fallbacks))
        .collect();
    let pitchers: Vec<PitcherStats> = lineups
        .pitchers()
        .iter()
        .map(|name| pitcher_stats(name, tables, fallbacks))
        .collect();

    info!(
        game_pk = lineups.game_pk,
        batters = batters.len(),
        "matchup report built"
    );

    Ok(MatchupReport {
        date,
        game_pk: lineups.game_pk,
        away: lineups.away,
        home: lineups.home,
        batters,
        pitchers,
        empty_lineups,
    })
}
