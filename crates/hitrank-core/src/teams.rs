// MLB club table and abbreviation lookup.
//
// The stat tables, the Stats API and the weather page each abbreviate clubs
// differently, so lookup accepts every scheme seen in the wild and resolves
// to one canonical `Team`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Canonical abbreviation (FanGraphs style: KCR, SDP, SFG, TBR, ...).
    pub abbr: &'static str,
    /// Full club name as the Stats API reports it.
    pub name: &'static str,
    /// Nickname used by scraped pages ("Phillies").
    pub nickname: &'static str,
    /// Alternative abbreviations that resolve to this club.
    pub aliases: &'static [&'static str],
    /// Alternative full names the Stats API has used for this club.
    pub alt_names: &'static [&'static str],
}

impl Team {
    /// True if `api_name` is this club's full name or a known alternative.
    pub fn matches_name(&self, api_name: &str) -> bool {
        let api_name = api_name.trim();
        self.name.eq_ignore_ascii_case(api_name)
            || self.alt_names.iter().any(|n| n.eq_ignore_ascii_case(api_name))
    }

    /// True if `abbr` is the canonical abbreviation or an alias.
    pub fn matches_abbr(&self, abbr: &str) -> bool {
        let abbr = abbr.trim();
        self.abbr.eq_ignore_ascii_case(abbr) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(abbr))
    }

    /// Loose match for free-form labels on scraped pages: abbreviation,
    /// nickname, or full name.
    pub fn matches_label(&self, label: &str) -> bool {
        let label = label.trim();
        self.matches_abbr(label)
            || self.matches_name(label)
            || self.nickname.eq_ignore_ascii_case(label)
            || label.to_lowercase().contains(&self.nickname.to_lowercase())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TeamError {
    #[error("unknown team abbreviation: {0}")]
    Unknown(String),
}

macro_rules! team {
    ($abbr:literal, $name:literal, $nick:literal, [$($alias:literal),*], [$($alt:literal),*]) => {
        Team {
            abbr: $abbr,
            name: $name,
            nickname: $nick,
            aliases: &[$($alias),*],
            alt_names: &[$($alt),*],
        }
    };
}

pub static TEAMS: [Team; 30] = [
    team!("ARI", "Arizona Diamondbacks", "Diamondbacks", ["AZ"], []),
    team!("ATL", "Atlanta Braves", "Braves", [], []),
    team!("BAL", "Baltimore Orioles", "Orioles", [], []),
    team!("BOS", "Boston Red Sox", "Red Sox", [], []),
    team!("CHC", "Chicago Cubs", "Cubs", [], []),
    team!("CHW", "Chicago White Sox", "White Sox", ["CWS"], []),
    team!("CIN", "Cincinnati Reds", "Reds", [], []),
    team!("CLE", "Cleveland Guardians", "Guardians", [], []),
    team!("COL", "Colorado Rockies", "Rockies", [], []),
    team!("DET", "Detroit Tigers", "Tigers", [], []),
    team!("HOU", "Houston Astros", "Astros", [], []),
    team!("KCR", "Kansas City Royals", "Royals", ["KC"], []),
    team!("LAA", "Los Angeles Angels", "Angels", ["ANA"], []),
    team!("LAD", "Los Angeles Dodgers", "Dodgers", ["LA"], []),
    team!("MIA", "Miami Marlins", "Marlins", ["FLA"], []),
    team!("MIL", "Milwaukee Brewers", "Brewers", [], []),
    team!("MIN", "Minnesota Twins", "Twins", [], []),
    team!("NYM", "New York Mets", "Mets", [], []),
    team!("NYY", "New York Yankees", "Yankees", [], []),
    team!("OAK", "Oakland Athletics", "Athletics", ["ATH"], ["Athletics"]),
    team!("PHI", "Philadelphia Phillies", "Phillies", [], []),
    team!("PIT", "Pittsburgh Pirates", "Pirates", [], []),
    team!("SDP", "San Diego Padres", "Padres", ["SD"], []),
    team!("SEA", "Seattle Mariners", "Mariners", [], []),
    team!("SFG", "San Francisco Giants", "Giants", ["SF"], []),
    team!("STL", "St. Louis Cardinals", "Cardinals", [], []),
    team!("TBR", "Tampa Bay Rays", "Rays", ["TB"], []),
    team!("TEX", "Texas Rangers", "Rangers", [], []),
    team!("TOR", "Toronto Blue Jays", "Blue Jays", [], []),
    team!("WSH", "Washington Nationals", "Nationals", ["WSN", "WAS"], []),
];

/// Resolve an abbreviation in any supported scheme. Case and surrounding
/// whitespace are ignored.
pub fn lookup(abbr: &str) -> Result<&'static Team, TeamError> {
    TEAMS
        .iter()
        .find(|t| t.matches_abbr(abbr))
        .ok_or_else(|| TeamError::Unknown(abbr.trim().to_uppercase()))
}

/// Find the club the Stats API calls `api_name`.
pub fn by_api_name(api_name: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.matches_name(api_name))
}
