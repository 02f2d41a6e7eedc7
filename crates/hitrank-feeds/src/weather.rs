// Daily ballpark weather page scraper (wind speed and direction).
//
// The page is third-party markup, so every selector comes from
// `sources.toml` and parsing is tolerant: a block without a readable wind
// line is still returned with `wind: None`.

use std::fmt;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info};

use hitrank_core::config::{Config, WeatherConfig};
use hitrank_core::teams::Team;

use crate::http;
use crate::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Blowing {
    Out,
    In,
    Cross,
    Calm,
    Unknown,
}

impl fmt::Display for Blowing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Blowing::Out => "blowing out",
            Blowing::In => "blowing in",
            Blowing::Cross => "crosswind",
            Blowing::Calm => "calm",
            Blowing::Unknown => "direction unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wind {
    pub speed_mph: Option<f64>,
    /// Text after the speed, e.g. "Out to CF" or "L to R".
    pub direction: String,
    pub blowing: Blowing,
}

impl Wind {
    /// Parse a wind line such as "Wind 12 mph Out to CF" or "Wind: 8mph, L to R".
    pub fn parse(text: &str) -> Option<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut speed = None;
        let mut rest_start = None;

        for (i, tok) in tokens.iter().enumerate() {
            let lower = tok.to_lowercase();
            let lower = lower.trim_end_matches([',', '.', ';']);
            if lower == "mph" && i > 0 {
                speed = tokens[i - 1].parse::<f64>().ok();
                rest_start = Some(i + 1);
                break;
            }
            if let Some(num) = lower.strip_suffix("mph") {
                if let Ok(v) = num.parse::<f64>() {
                    speed = Some(v);
                    rest_start = Some(i + 1);
                    break;
                }
            }
        }

        let lower_text = text.to_lowercase();
        if rest_start.is_none() && !lower_text.contains("calm") {
            return None;
        }

        let direction = rest_start
            .map(|start| tokens[start.min(tokens.len())..].join(" "))
            .unwrap_or_default()
            .trim_matches(|c: char| c == ',' || c == ':' || c.is_whitespace())
            .to_string();
        let dir_lower = direction.to_lowercase();

        let blowing = if lower_text.contains("calm") || speed == Some(0.0) {
            Blowing::Calm
        } else if dir_lower.starts_with("out") || dir_lower.contains("blowing out") {
            Blowing::Out
        } else if dir_lower.starts_with("in") || dir_lower.contains("blowing in") {
            Blowing::In
        } else if dir_lower.contains(" to ") || dir_lower.contains("cross") {
            Blowing::Cross
        } else {
            Blowing::Unknown
        };

        Some(Self {
            speed_mph: speed,
            direction,
            blowing,
        })
    }
}

impl fmt::Display for Wind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speed_mph {
            Some(mph) => write!(f, "{mph:.0} mph")?,
            None => f.write_str("? mph")?,
        }
        if !self.direction.is_empty() {
            write!(f, " {}", self.direction)?;
        }
        write!(f, " ({})", self.blowing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameWeather {
    pub teams: Vec<String>,
    pub wind: Option<Wind>,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct WeatherSelectors {
    game: Selector,
    team: Selector,
    wind: Selector,
}

fn selector(css: &str) -> Result<Selector, FeedError> {
    Selector::parse(css).map_err(|_| FeedError::Selector(css.to_string()))
}

impl WeatherSelectors {
    pub fn new(game: &str, team: &str, wind: &str) -> Result<Self, FeedError> {
        Ok(Self {
            game: selector(game)?,
            team: selector(team)?,
            wind: selector(wind)?,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, FeedError> {
        Self::new(&config.game_selector, &config.team_selector, &config.wind_selector)
    }
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract one entry per game block on the page.
pub fn parse_weather(html: &str, selectors: &WeatherSelectors) -> Vec<GameWeather> {
    let document = Html::parse_document(html);
    document
        .select(&selectors.game)
        .map(|block| {
            let teams = block
                .select(&selectors.team)
                .map(collapsed_text)
                .filter(|t| !t.is_empty())
                .collect();
            let wind = block
                .select(&selectors.wind)
                .map(collapsed_text)
                .find_map(|t| Wind::parse(&t));
            GameWeather {
                teams,
                wind,
                summary: collapsed_text(block),
            }
        })
        .collect()
}

/// First block whose team labels name both clubs.
pub fn find_game<'a>(reports: &'a [GameWeather], team1: &Team, team2: &Team) -> Option<&'a GameWeather> {
    reports.iter().find(|r| {
        r.teams.iter().any(|t| team1.matches_label(t)) && r.teams.iter().any(|t| team2.matches_label(t))
    })
}

pub struct WeatherScraper {
    http: reqwest::Client,
    url: String,
    selectors: WeatherSelectors,
}

impl WeatherScraper {
    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        let api = &config.sources.statsapi;
        Ok(Self {
            http: http::build_client(&api.user_agent, Duration::from_secs(api.timeout_secs))?,
            url: config.sources.weather.url.clone(),
            selectors: WeatherSelectors::from_config(&config.sources.weather)?,
        })
    }

    pub async fn fetch(&self) -> Result<Vec<GameWeather>, FeedError> {
        let html = http::get_text(&self.http, &self.url).await?;
        let reports = parse_weather(&html, &self.selectors);
        info!("weather page: {} game blocks", reports.len());
        Ok(reports)
    }

    /// Weather for one matchup, or `None` if the page has no block for it.
    pub async fn lookup(&self, team1: &Team, team2: &Team) -> Result<Option<GameWeather>, FeedError> {
        let reports = self.fetch().await?;
        let found = find_game(&reports, team1, team2).cloned();
        if found.is_none() {
            debug!("no weather block for {team1} vs {team2}");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitrank_core::teams;

    #[test]
    fn wind_parses_speed_and_direction() {
        let w = Wind::parse("Wind 12 mph Out to CF").unwrap();
        assert_eq!(w.speed_mph, Some(12.0));
        assert_eq!(w.direction, "Out to CF");
        assert_eq!(w.blowing, Blowing::Out);
    }

    #[test]
    fn wind_parses_attached_unit_and_crosswind() {
        let w = Wind::parse("Wind: 8mph, L to R").unwrap();
        assert_eq!(w.speed_mph, Some(8.0));
        assert_eq!(w.direction, "L to R");
        assert_eq!(w.blowing, Blowing::Cross);
    }

    #[test]
    fn wind_in_and_calm() {
        assert_eq!(Wind::parse("7 mph In from LF").unwrap().blowing, Blowing::In);
        let calm = Wind::parse("Wind calm").unwrap();
        assert_eq!(calm.blowing, Blowing::Calm);
        assert_eq!(calm.speed_mph, None);
        assert_eq!(Wind::parse("0 mph").unwrap().blowing, Blowing::Calm);
    }

    #[test]
    fn text_without_wind_is_none() {
        assert_eq!(Wind::parse("Dome - no weather concerns"), None);
    }

    #[test]
    fn wind_display() {
        let w = Wind::parse("Wind 12 mph Out to CF").unwrap();
        assert_eq!(w.to_string(), "12 mph Out to CF (blowing out)");
    }

    #[test]
    fn bad_selector_is_rejected() {
        assert!(matches!(
            WeatherSelectors::new("div[", ".t", ".w"),
            Err(FeedError::Selector(_))
        ));
    }

    #[test]
    fn parses_blocks_and_finds_matchup() {
        let html = r#"
            <html><body>
              <div class="game">
                <span class="team">Mets</span><span class="team">Braves</span>
                <div class="wind">Wind 5 mph In from CF</div>
              </div>
              <div class="game">
                <span class="team">COL</span><span class="team">PHI</span>
                <div class="wind">Wind   14 mph
                   Out to RF</div>
              </div>
              <div class="game">
                <span class="team">Rays</span><span class="team">Yankees</span>
                <div class="wind">Dome</div>
              </div>
            </body></html>"#;
        let selectors = WeatherSelectors::new(".game", ".team", ".wind").unwrap();
        let reports = parse_weather(html, &selectors);
        assert_eq!(reports.len(), 3);
        assert!(reports[2].wind.is_none());

        let phi = teams::lookup("PHI").unwrap();
        let col = teams::lookup("COL").unwrap();
        let game = find_game(&reports, phi, col).unwrap();
        assert_eq!(game.teams, vec!["COL", "PHI"]);
        let wind = game.wind.as_ref().unwrap();
        assert_eq!(wind.speed_mph, Some(14.0));
        assert_eq!(wind.direction, "Out to RF");

        let nym = teams::lookup("NYM").unwrap();
        let atl = teams::lookup("ATL").unwrap();
        assert_eq!(find_game(&reports, atl, nym).unwrap().wind.as_ref().unwrap().blowing, Blowing::In);
        assert!(find_game(&reports, phi, nym).is_none());
    }
}
