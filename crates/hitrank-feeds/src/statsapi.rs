// MLB Stats API client: daily schedule and per-game boxscore.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use hitrank_core::config::Config;
use hitrank_core::lineup::{Boxscore, BoxscorePlayer, GameFeed, ScheduledGame};
use hitrank_core::store::Store;

use crate::http;
use crate::FeedError;

// ---------------------------------------------------------------------------
// Raw JSON shapes (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSchedule {
    #[serde(default)]
    dates: Vec<RawDate>,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    #[serde(default)]
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    game_pk: u64,
    teams: RawGameTeams,
}

#[derive(Debug, Deserialize)]
struct RawGameTeams {
    away: RawGameSide,
    home: RawGameSide,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGameSide {
    team: RawTeam,
    #[serde(default)]
    probable_pitcher: Option<RawPerson>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerson {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RawBoxscore {
    #[serde(default)]
    teams: RawBoxTeams,
}

#[derive(Debug, Default, Deserialize)]
struct RawBoxTeams {
    #[serde(default)]
    away: Option<RawBoxSide>,
    #[serde(default)]
    home: Option<RawBoxSide>,
}

#[derive(Debug, Deserialize)]
struct RawBoxSide {
    #[serde(default)]
    players: BTreeMap<String, RawBoxPlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoxPlayer {
    person: RawPerson,
    #[serde(default)]
    batting_order: Option<RawOrder>,
}

/// `battingOrder` has shipped both as "100" and as 100.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOrder {
    Number(u32),
    Text(String),
}

impl RawOrder {
    fn value(&self) -> Option<u32> {
        match self {
            RawOrder::Number(n) => Some(*n),
            RawOrder::Text(s) => s.trim().parse().ok(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_schedule(json: &str) -> Result<Vec<ScheduledGame>, FeedError> {
    let raw: RawSchedule = serde_json::from_str(json).map_err(|e| FeedError::Decode {
        origin: "schedule".into(),
        source: e,
    })?;
    Ok(raw
        .dates
        .into_iter()
        .flat_map(|d| d.games)
        .map(|g| ScheduledGame {
            game_pk: g.game_pk,
            away_name: g.teams.away.team.name,
            home_name: g.teams.home.team.name,
            away_probable: g.teams.away.probable_pitcher.map(|p| p.full_name),
            home_probable: g.teams.home.probable_pitcher.map(|p| p.full_name),
        })
        .collect())
}

fn side_players(side: Option<RawBoxSide>) -> Vec<BoxscorePlayer> {
    let Some(side) = side else {
        return Vec::new();
    };
    side.players
        .into_values()
        .map(|p| {
            let batting_order = p.batting_order.as_ref().and_then(|o| {
                let v = o.value();
                if v.is_none() {
                    warn!("unparseable battingOrder for {}: {o:?}", p.person.full_name);
                }
                v
            });
            BoxscorePlayer {
                full_name: p.person.full_name,
                batting_order,
            }
        })
        .collect()
}

pub fn parse_boxscore(json: &str) -> Result<Boxscore, FeedError> {
    let raw: RawBoxscore = serde_json::from_str(json).map_err(|e| FeedError::Decode {
        origin: "boxscore".into(),
        source: e,
    })?;
    Ok(Boxscore {
        away: side_players(raw.teams.away),
        home: side_players(raw.teams.home),
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct StatsApiClient {
    http: reqwest::Client,
    base_url: String,
    cache: Option<Arc<Store>>,
    ttl: Duration,
}

impl StatsApiClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            http: http::build_client(user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: None,
            ttl: Duration::ZERO,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        let api = &config.sources.statsapi;
        Self::new(&api.base_url, &api.user_agent, Duration::from_secs(api.timeout_secs))
    }

    /// Serve responses younger than `ttl` from `store`.
    pub fn with_cache(mut self, store: Arc<Store>, ttl: Duration) -> Self {
        self.cache = Some(store);
        self.ttl = ttl;
        self
    }

    /// Probable pitchers are only included when hydrated.
    pub fn schedule_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/schedule?sportId=1&date={}&hydrate=probablePitcher",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }

    pub fn boxscore_url(&self, game_pk: u64) -> String {
        format!("{}/game/{game_pk}/boxscore", self.base_url)
    }

    /// A cached body that no longer parses is ignored and fetched again.
    async fn fetch<T>(&self, url: &str, parse: fn(&str) -> Result<T, FeedError>) -> anyhow::Result<T> {
        if let Some(store) = &self.cache {
            match store.cache_get(url, self.ttl) {
                Ok(Some(body)) => match parse(&body) {
                    Ok(value) => {
                        debug!("cache hit for {url}");
                        return Ok(value);
                    }
                    Err(e) => warn!("ignoring cached body for {url}: {e}"),
                },
                Ok(None) => debug!("cache miss for {url}"),
                Err(e) => warn!("cache read failed for {url}: {e:#}"),
            }
        }

        let body = http::get_text(&self.http, url).await?;
        Ok(self.accept(url, &body, parse)?)
    }

    /// Parse a fresh body and cache it only once it parses.
    fn accept<T>(&self, url: &str, body: &str, parse: fn(&str) -> Result<T, FeedError>) -> Result<T, FeedError> {
        let value = parse(body)?;
        if let Some(store) = &self.cache {
            if let Err(e) = store.cache_put(url, body, self.ttl) {
                warn!("cache write failed for {url}: {e:#}");
            }
        }
        Ok(value)
    }
}

#[async_trait]
impl GameFeed for StatsApiClient {
    async fn schedule(&self, date: NaiveDate) -> anyhow::Result<Vec<ScheduledGame>> {
        let games = self.fetch(&self.schedule_url(date), parse_schedule).await?;
        info!("schedule for {date}: {} games", games.len());
        Ok(games)
    }

    async fn boxscore(&self, game_pk: u64) -> anyhow::Result<Boxscore> {
        self.fetch(&self.boxscore_url(game_pk), parse_boxscore).await
    }
}
