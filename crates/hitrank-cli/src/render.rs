// Plain-text output for each subcommand.

use std::fmt::Write;

use hitrank_core::lineup::GameLineups;
use hitrank_core::report::MatchupReport;
use hitrank_core::scoring::{RankedHitter, WeightSet};
use hitrank_core::store::RankingRun;
use hitrank_feeds::drive::UpdateOutcome;
use hitrank_feeds::weather::GameWeather;

pub const NA: &str = "n/a";

/// Whole numbers keep one decimal so "87.0" does not print as "87".
pub fn value(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => format!("{v}"),
        None => NA.to_string(),
    }
}

pub fn lineups(lineups: &GameLineups) -> String {
    let mut out = String::from("Batters:\n");
    for name in lineups.batters() {
        let _ = writeln!(out, "- {name}");
    }
    out.push_str("Pitchers:\n");
    for name in lineups.pitchers() {
        let _ = writeln!(out, "- {name}");
    }
    out
}

pub fn stats(report: &MatchupReport) -> String {
    let mut out = String::from("Batter Stats:\n");
    for b in &report.batters {
        let _ = writeln!(
            out,
            "{} | EV: {} | Barrel %: {} | xSLG: {} | PullAir %: {} | OppoAir %: {} | FB %: {}",
            b.name,
            value(b.ev),
            value(b.barrel_pct),
            value(b.xslg),
            value(b.pull_air_pct),
            value(b.oppo_air_pct),
            value(b.fb_pct),
        );
    }
    out.push_str("Pitcher Stats:\n");
    for p in &report.pitchers {
        let _ = writeln!(
            out,
            "{} | Hard-Hit %: {} | Barrel % Allowed: {} | xSLG Allowed: {} | xwOBA Allowed: {}",
            p.name,
            value(p.hard_hit_pct),
            value(p.barrel_allowed_pct),
            value(p.xslg_allowed),
            value(p.xwoba_allowed),
        );
    }
    out
}

pub fn ranking(title: &str, weights: &WeightSet, ranked: &[RankedHitter], top: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "Weights: {weights}");
    out.push_str("Rank | Player | Score\n");
    let shown = top.unwrap_or(ranked.len()).min(ranked.len());
    for r in &ranked[..shown] {
        let _ = writeln!(out, "{} | {} | {:.3}", r.rank, r.name, r.score);
    }
    out
}

pub fn weather(game: Option<&GameWeather>) -> String {
    match game {
        Some(GameWeather { wind: Some(wind), .. }) => format!("Wind: {wind}"),
        Some(game) => format!("Wind: {NA} ({})", game.summary),
        None => String::from("weather unavailable"),
    }
}

pub fn history(runs: &[RankingRun]) -> String {
    if runs.is_empty() {
        return String::from("No saved rankings.\n");
    }
    let mut out = String::new();
    for run in runs {
        let leader = run
            .results
            .first()
            .map(|r| format!("{} ({:.3})", r.name, r.score))
            .unwrap_or_else(|| NA.to_string());
        let _ = writeln!(
            out,
            "#{} {} {} | {} | {} ranked | top: {}",
            run.id,
            run.game_date,
            run.matchup,
            run.weights,
            run.results.len(),
            leader,
        );
    }
    out
}

pub fn updates(outcomes: &[UpdateOutcome]) -> String {
    if outcomes.is_empty() {
        return String::from(
            "No Drive file ids configured. See defaults/drive.toml.example.\n",
        );
    }
    let mut out = String::new();
    for o in outcomes {
        let _ = match &o.result {
            Ok(bytes) => writeln!(out, "{}: {bytes} bytes -> {}", o.table, o.dest.display()),
            Err(e) => writeln!(out, "{}: FAILED ({e})", o.table),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hitrank_core::join::{BatterStats, PitcherStats};
    use hitrank_core::lineup::TeamLineup;
    use hitrank_core::scoring::{StatKey, Weight};
    use hitrank_core::stats::Side;
    use hitrank_feeds::weather::Wind;

    fn lineup(team: &str, batters: &[&str], pitcher: &str) -> TeamLineup {
        TeamLineup {
            team_name: team.into(),
            batters: batters.iter().map(|s| s.to_string()).collect(),
            probable_pitcher: pitcher.into(),
        }
    }

    fn hitter(rank: usize, name: &str, score: f64) -> RankedHitter {
        RankedHitter {
            rank,
            name: name.into(),
            side: Side::Right,
            score,
            values: vec![score],
        }
    }

    #[test]
    fn values_mark_missing_as_na() {
        assert_eq!(value(None), "n/a");
        assert_eq!(value(Some(87.0)), "87.0");
        assert_eq!(value(Some(0.42)), "0.42");
    }

    #[test]
    fn lineups_list_batters_then_pitchers() {
        let game = GameLineups {
            game_pk: 1,
            away: lineup("Colorado Rockies", &["Ezequiel Tovar"], "Kyle Freeland"),
            home: lineup("Philadelphia Phillies", &["Kyle Schwarber"], "TBD"),
        };
        assert_eq!(
            lineups(&game),
            "Batters:\n- Ezequiel Tovar\n- Kyle Schwarber\nPitchers:\n- Kyle Freeland\n- TBD\n"
        );
    }

    #[test]
    fn stats_lines_follow_column_order() {
        let report = MatchupReport {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            game_pk: 1,
            away: lineup("Colorado Rockies", &[], "TBD"),
            home: lineup("Philadelphia Phillies", &[], "TBD"),
            batters: vec![BatterStats {
                name: "Kyle Schwarber".into(),
                ev: Some(94.1),
                barrel_pct: Some(19.5),
                xslg: Some(0.521),
                pull_air_pct: Some(24.3),
                oppo_air_pct: Some(7.7),
                fb_pct: None,
            }],
            pitchers: vec![
                PitcherStats {
                    name: "Kyle Freeland".into(),
                    hard_hit_pct: Some(43.5),
                    barrel_allowed_pct: Some(8.25),
                    xslg_allowed: Some(0.468),
                    xwoba_allowed: Some(0.342),
                },
                PitcherStats {
                    name: "TBD".into(),
                    hard_hit_pct: None,
                    barrel_allowed_pct: None,
                    xslg_allowed: None,
                    xwoba_allowed: None,
                },
            ],
            empty_lineups: false,
        };
        assert_eq!(
            stats(&report),
            "Batter Stats:\n\
             Kyle Schwarber | EV: 94.1 | Barrel %: 19.5 | xSLG: 0.521 | PullAir %: 24.3 | OppoAir %: 7.7 | FB %: n/a\n\
             Pitcher Stats:\n\
             Kyle Freeland | Hard-Hit %: 43.5 | Barrel % Allowed: 8.25 | xSLG Allowed: 0.468 | xwOBA Allowed: 0.342\n\
             TBD | Hard-Hit %: n/a | Barrel % Allowed: n/a | xSLG Allowed: n/a | xwOBA Allowed: n/a\n"
        );
    }

    #[test]
    fn ranking_table_respects_top() {
        let weights = WeightSet::new(vec![Weight {
            stat: StatKey::Xslg,
            weight: 1.0,
        }])
        .unwrap();
        let ranked = vec![hitter(1, "A", 0.5214), hitter(2, "B", 0.4), hitter(3, "C", 0.3)];
        let out = ranking("COL @ PHI, 2025-06-01", &weights, &ranked, Some(2));
        assert_eq!(
            out,
            "COL @ PHI, 2025-06-01\nWeights: xSLG×1.00\nRank | Player | Score\n1 | A | 0.521\n2 | B | 0.400\n"
        );
        assert_eq!(ranking("t", &weights, &ranked, Some(10)).lines().count(), 6);
    }

    #[test]
    fn weather_variants() {
        let with_wind = GameWeather {
            teams: vec!["COL".into(), "PHI".into()],
            wind: Wind::parse("Wind 14 mph Out to RF"),
            summary: "COL PHI Wind 14 mph Out to RF".into(),
        };
        assert_eq!(weather(Some(&with_wind)), "Wind: 14 mph Out to RF (blowing out)");

        let dome = GameWeather {
            teams: vec!["TB".into(), "NYY".into()],
            wind: None,
            summary: "Dome".into(),
        };
        assert_eq!(weather(Some(&dome)), "Wind: n/a (Dome)");
        assert_eq!(weather(None), "weather unavailable");
    }

    #[test]
    fn empty_history_and_updates() {
        assert_eq!(history(&[]), "No saved rankings.\n");
        assert!(updates(&[]).starts_with("No Drive file ids configured"));
    }
}
