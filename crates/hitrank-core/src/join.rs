// Per-player join of lineup names against the stat tables.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Fallbacks;
use crate::names::{clean_name, format_to_last_first};
use crate::stats::StatTables;

/// Joined batter row. `None` means the value is unavailable ("n/a").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterStats {
    pub name: String,
    pub ev: Option<f64>,
    pub barrel_pct: Option<f64>,
    pub xslg: Option<f64>,
    pub pull_air_pct: Option<f64>,
    pub oppo_air_pct: Option<f64>,
    pub fb_pct: Option<f64>,
}

impl BatterStats {
    fn unavailable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ev: None,
            barrel_pct: None,
            xslg: None,
            pull_air_pct: None,
            oppo_air_pct: None,
            fb_pct: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherStats {
    pub name: String,
    pub hard_hit_pct: Option<f64>,
    pub barrel_allowed_pct: Option<f64>,
    pub xslg_allowed: Option<f64>,
    pub xwoba_allowed: Option<f64>,
}

/// Join one batter.
///
/// Exit-velocity and expected-stats values fall back to `fallbacks` when the
/// player has no row at all; a present row with an empty cell stays `None`.
/// Batted-ball rates have no fallback.
pub fn batter_stats(name: &str, tables: &StatTables, fallbacks: &Fallbacks) -> BatterStats {
    let Some(last_first) = format_to_last_first(name) else {
        debug!("cannot split '{name}' into first/last; all stats n/a");
        return BatterStats::unavailable(name);
    };
    let key = last_first.to_lowercase();

    let (ev, barrel_pct) = match tables.exit_batters.get(&key) {
        Some(row) => (row.avg_hit_speed, row.brl_percent),
        None => {
            debug!("no exit-velocity row for '{name}', using fallbacks");
            (Some(fallbacks.ev), Some(fallbacks.barrel_pct))
        }
    };

    let xslg = match tables.expected_batters.get(&key) {
        Some(row) => row.est_slg,
        None => {
            debug!("no expected-stats row for '{name}', using fallback");
            Some(fallbacks.xslg)
        }
    };

    let batted = tables.batted_ball.get(&clean_name(&last_first));
    if batted.is_none() {
        debug!("no batted-ball row for '{name}'");
    }

    BatterStats {
        name: name.to_string(),
        ev,
        barrel_pct,
        xslg,
        pull_air_pct: batted.and_then(|r| r.pull_air_rate),
        oppo_air_pct: batted.and_then(|r| r.oppo_air_rate),
        fb_pct: batted.and_then(|r| r.fb_rate),
    }
}

/// Join one pitcher. "TBD" and other single-token names yield all `None`.
pub fn pitcher_stats(name: &str, tables: &StatTables, fallbacks: &Fallbacks) -> PitcherStats {
    let Some(last_first) = format_to_last_first(name) else {
        return PitcherStats {
            name: name.to_string(),
            hard_hit_pct: None,
            barrel_allowed_pct: None,
            xslg_allowed: None,
            xwoba_allowed: None,
        };
    };
    let key = last_first.to_lowercase();

    let (hard_hit_pct, barrel_allowed_pct) = match tables.exit_pitchers.get(&key) {
        Some(row) => (row.ev95percent, row.brl_percent),
        None => (Some(fallbacks.hard_hit_pct), Some(fallbacks.barrel_allowed_pct)),
    };
    let expected = tables.expected_pitchers.get(&key);

    PitcherStats {
        name: name.to_string(),
        hard_hit_pct,
        barrel_allowed_pct,
        xslg_allowed: expected.and_then(|r| r.est_slg),
        xwoba_allowed: expected.and_then(|r| r.est_woba),
    }
}
