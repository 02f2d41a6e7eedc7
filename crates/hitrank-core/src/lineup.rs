// Matchup lineups: schedule lookup and batting-order extraction.
//
// The game feed itself (HTTP, caching) lives in hitrank-feeds behind the
// `GameFeed` trait so the selection logic here can run against fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::teams::Team;

pub const TBD: &str = "TBD";

// ---------------------------------------------------------------------------
// Feed-side types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub game_pk: u64,
    pub away_name: String,
    pub home_name: String,
    pub away_probable: Option<String>,
    pub home_probable: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxscorePlayer {
    pub full_name: String,
    /// Stats API batting order: 100, 200, ... for starters; 101, 102, ...
    /// for players who entered in that slot.
    pub batting_order: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boxscore {
    pub away: Vec<BoxscorePlayer>,
    pub home: Vec<BoxscorePlayer>,
}

/// Source of schedules and boxscores.
#[async_trait]
pub trait GameFeed: Send + Sync {
    async fn schedule(&self, date: NaiveDate) -> anyhow::Result<Vec<ScheduledGame>>;
    async fn boxscore(&self, game_pk: u64) -> anyhow::Result<Boxscore>;
}

// ---------------------------------------------------------------------------
// Lineups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLineup {
    pub team_name: String,
    pub batters: Vec<String>,
    pub probable_pitcher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLineups {
    pub game_pk: u64,
    pub away: TeamLineup,
    pub home: TeamLineup,
}

impl GameLineups {
    /// Away batters, then home batters, each in batting order.
    pub fn batters(&self) -> Vec<String> {
        self.away
            .batters
            .iter()
            .chain(&self.home.batters)
            .cloned()
            .collect()
    }

    /// `[away probable, home probable]`.
    pub fn pitchers(&self) -> [String; 2] {
        [
            self.away.probable_pitcher.clone(),
            self.home.probable_pitcher.clone(),
        ]
    }

    pub fn has_lineups(&self) -> bool {
        !self.away.batters.is_empty() || !self.home.batters.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineupOptions {
    /// Keep only the player listed first in each slot.
    pub starters_only: bool,
}

/// Players with a batting order, sorted by it.
pub fn batting_order(players: &[BoxscorePlayer], opts: LineupOptions) -> Vec<String> {
    let mut ordered: Vec<(u32, &str)> = players
        .iter()
        .filter_map(|p| p.batting_order.map(|o| (o, p.full_name.as_str())))
        .filter(|(o, _)| !opts.starters_only || o % 100 == 0)
        .collect();
    ordered.sort();
    ordered.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn is_matchup(game: &ScheduledGame, team1: &Team, team2: &Team) -> bool {
    (team1.matches_name(&game.away_name) && team2.matches_name(&game.home_name))
        || (team2.matches_name(&game.away_name) && team1.matches_name(&game.home_name))
}

/// Find the first game on `date` between the two clubs (either home/away
/// order) and pull its lineups. `Ok(None)` when no such game is scheduled.
pub async fn find_lineups(
    feed: &dyn GameFeed,
    team1: &Team,
    team2: &Team,
    date: NaiveDate,
    opts: LineupOptions,
) -> anyhow::Result<Option<GameLineups>> {
    let games = feed.schedule(date).await?;
    debug!("{} games scheduled on {date}", games.len());

    let Some(game) = games.iter().find(|g| is_matchup(g, team1, team2)) else {
        info!("no {team1} vs {team2} game on {date}");
        return Ok(None);
    };

    let boxscore = feed.boxscore(game.game_pk).await?;
    let lineups = GameLineups {
        game_pk: game.game_pk,
        away: TeamLineup {
            team_name: game.away_name.clone(),
            batters: batting_order(&boxscore.away, opts),
            probable_pitcher: game.away_probable.clone().unwrap_or_else(|| TBD.to_string()),
        },
        home: TeamLineup {
            team_name: game.home_name.clone(),
            batters: batting_order(&boxscore.home, opts),
            probable_pitcher: game.home_probable.clone().unwrap_or_else(|| TBD.to_string()),
        },
    };
    info!(
        game_pk = lineups.game_pk,
        away = lineups.away.batters.len(),
        home = lineups.home.batters.len(),
        "lineups resolved"
    );
    Ok(Some(lineups))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, order: Option<u32>) -> BoxscorePlayer {
        BoxscorePlayer {
            full_name: name.into(),
            batting_order: order,
        }
    }

    #[test]
    fn batting_order_sorts_and_skips_unlisted() {
        let players = vec![
            player("Cleanup", Some(400)),
            player("Bench Arm", None),
            player("Leadoff", Some(100)),
            player("Pinch Hitter", Some(101)),
            player("Two Hole", Some(200)),
        ];
        let order = batting_order(&players, LineupOptions::default());
        assert_eq!(order, vec!["Leadoff", "Pinch Hitter", "Two Hole", "Cleanup"]);
    }

    #[test]
    fn starters_only_drops_substitutes() {
        let players = vec![
            player("Leadoff", Some(100)),
            player("Pinch Hitter", Some(101)),
            player("Two Hole", Some(200)),
        ];
        let order = batting_order(&players, LineupOptions { starters_only: true });
        assert_eq!(order, vec!["Leadoff", "Two Hole"]);
    }

    #[test]
    fn batters_and_pitchers_are_away_first() {
        let lineups = GameLineups {
            game_pk: 1,
            away: TeamLineup {
                team_name: "Colorado Rockies".into(),
                batters: vec!["Away One".into()],
                probable_pitcher: "Away Arm".into(),
            },
            home: TeamLineup {
                team_name: "Philadelphia Phillies".into(),
                batters: vec!["Home One".into()],
                probable_pitcher: TBD.into(),
            },
        };
        assert_eq!(lineups.batters(), vec!["Away One", "Home One"]);
        assert_eq!(lineups.pitchers(), ["Away Arm".to_string(), "TBD".to_string()]);
        assert!(lineups.has_lineups());
    }
}
