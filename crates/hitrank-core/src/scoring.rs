// Weighted linear hitter score: score = Σ(weight_i * stat_i).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::WeightEntry;
use crate::join::BatterStats;
use crate::stats::{HandednessTable, Side};

pub const MIN_WEIGHTS: usize = 1;
pub const MAX_WEIGHTS: usize = 4;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScoringError {
    #[error("unknown stat '{0}' (expected one of: EV, Barrel %, xSLG, FB %, RightFly, LeftFly)")]
    UnknownStat(String),

    #[error("weight for {stat} must be between 0.0 and 1.0 inclusive, got {weight}")]
    WeightOutOfRange { stat: StatKey, weight: f64 },

    #[error("between 1 and 4 weighted stats are required, got {0}")]
    WrongCount(usize),

    #[error("invalid weight spec '{0}' (expected STAT=WEIGHT)")]
    BadSpec(String),
}

// ---------------------------------------------------------------------------
// Stat keys
// ---------------------------------------------------------------------------

/// A stat the score can weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    Ev,
    BarrelPct,
    Xslg,
    FbPct,
    /// Fly-ball rate to right field: pull-side for right-handed batters,
    /// opposite-field for everyone else.
    RightFly,
    /// Fly-ball rate to left field: pull-side for left-handed batters,
    /// opposite-field for everyone else.
    LeftFly,
}

impl StatKey {
    pub const ALL: [StatKey; 6] = [
        StatKey::Ev,
        StatKey::BarrelPct,
        StatKey::Xslg,
        StatKey::FbPct,
        StatKey::RightFly,
        StatKey::LeftFly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKey::Ev => "EV",
            StatKey::BarrelPct => "Barrel %",
            StatKey::Xslg => "xSLG",
            StatKey::FbPct => "FB %",
            StatKey::RightFly => "RightFly",
            StatKey::LeftFly => "LeftFly",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            StatKey::Ev => "ev",
            StatKey::BarrelPct => "barrel",
            StatKey::Xslg => "xslg",
            StatKey::FbPct => "fb",
            StatKey::RightFly => "right-fly",
            StatKey::LeftFly => "left-fly",
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatKey {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        StatKey::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s) || k.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScoringError::UnknownStat(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub stat: StatKey,
    pub weight: f64,
}

impl FromStr for Weight {
    type Err = ScoringError;

    /// Parses `STAT=WEIGHT`, e.g. `Barrel %=0.3` or `xslg=0.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stat, weight) = s
            .rsplit_once('=')
            .ok_or_else(|| ScoringError::BadSpec(s.to_string()))?;
        let stat: StatKey = stat.parse()?;
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| ScoringError::BadSpec(s.to_string()))?;
        Ok(Weight { stat, weight })
    }
}

/// Validated selection of 1..=4 weighted stats. A stat may be selected more
/// than once; each selection contributes its own term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    weights: Vec<Weight>,
}

impl WeightSet {
    pub fn new(weights: Vec<Weight>) -> Result<Self, ScoringError> {
        if !(MIN_WEIGHTS..=MAX_WEIGHTS).contains(&weights.len()) {
            return Err(ScoringError::WrongCount(weights.len()));
        }
        for w in &weights {
            if !(0.0..=1.0).contains(&w.weight) {
                return Err(ScoringError::WeightOutOfRange {
                    stat: w.stat,
                    weight: w.weight,
                });
            }
        }
        Ok(Self { weights })
    }

    pub fn from_entries(entries: &[WeightEntry]) -> Result<Self, ScoringError> {
        let weights = entries
            .iter()
            .map(|e| {
                Ok(Weight {
                    stat: e.stat.parse()?,
                    weight: e.weight,
                })
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;
        Self::new(weights)
    }

    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn stats(&self) -> impl Iterator<Item = StatKey> + '_ {
        self.weights.iter().map(|w| w.stat)
    }
}

impl fmt::Display for WeightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}×{:.2}", w.stat, w.weight)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Resolve one stat for a batter, picking the pull-side or opposite-field
/// variant for the directional fly-ball keys.
pub fn stat_value(stats: &BatterStats, side: Side, key: StatKey) -> Option<f64> {
    match key {
        StatKey::Ev => stats.ev,
        StatKey::BarrelPct => stats.barrel_pct,
        StatKey::Xslg => stats.xslg,
        StatKey::FbPct => stats.fb_pct,
        StatKey::RightFly => {
            if side == Side::Right {
                stats.pull_air_pct
            } else {
                stats.oppo_air_pct
            }
        }
        StatKey::LeftFly => {
            if side == Side::Left {
                stats.pull_air_pct
            } else {
                stats.oppo_air_pct
            }
        }
    }
}

/// Weighted sum, or `None` if any selected stat is unavailable.
pub fn score(stats: &BatterStats, side: Side, weights: &WeightSet) -> Option<f64> {
    weights
        .weights()
        .iter()
        .map(|w| stat_value(stats, side, w.stat).map(|v| w.weight * v))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHitter {
    /// 1-based position after sorting.
    pub rank: usize,
    pub name: String,
    pub side: Side,
    pub score: f64,
    /// Value of each weighted stat, in `WeightSet` order.
    pub values: Vec<f64>,
}

/// Score every batter, drop those with an unavailable stat, and sort by
/// score descending. Ties keep lineup order.
pub fn rank(batters: &[BatterStats], handedness: &HandednessTable, weights: &WeightSet) -> Vec<RankedHitter> {
    let mut ranked: Vec<RankedHitter> = batters
        .iter()
        .filter_map(|b| {
            let side = handedness.side_of(&b.name);
            let total = score(b, side, weights)?;
            let values = weights
                .stats()
                .map(|k| stat_value(b, side, k))
                .collect::<Option<Vec<f64>>>()?;
            Some(RankedHitter {
                rank: 0,
                name: b.name.clone(),
                side,
                score: total,
                values,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (i, r) in ranked.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    ranked
}
