// SQLite persistence: HTTP response cache and ranking run history.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scoring::{RankedHitter, WeightSet};

pub struct Store {
    conn: Mutex<Connection>,
}

/// One saved `rank` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRun {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub weights: WeightSet,
    pub results: Vec<RankedHitter>,
}

/// Fixed-width UTC timestamps so `fetched_at` compares correctly as text.
fn cache_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Store {
    /// Open (or create) the database at `path` and ensure tables exist.
    /// `":memory:"` gives an ephemeral database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS http_cache (
                key        TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ranking_runs (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at   TEXT NOT NULL,
                game_date    TEXT NOT NULL,
                matchup      TEXT NOT NULL,
                weights_json TEXT NOT NULL,
                results_json TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned, which only happens after another
    /// thread panicked mid-query.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // -----------------------------------------------------------------------
    // HTTP cache
    // -----------------------------------------------------------------------

    /// Cached body for `key` if it was stored less than `max_age` ago.
    pub fn cache_get(&self, key: &str, max_age: Duration) -> Result<Option<String>> {
        self.cache_get_at(key, max_age, Utc::now())
    }

    fn cache_get_at(&self, key: &str, max_age: Duration, now: DateTime<Utc>) -> Result<Option<String>> {
        let conn = self.conn();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT body, fetched_at FROM http_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to query http cache")?;

        let Some((body, fetched_at)) = row else {
            return Ok(None);
        };
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .with_context(|| format!("bad fetched_at timestamp for cache key {key}"))?
            .with_timezone(&Utc);
        let max_age = chrono::Duration::from_std(max_age).context("cache max_age out of range")?;
        if now.signed_duration_since(fetched_at) < max_age {
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }

    /// Store `body` under `key` and drop every entry older than `max_age`.
    pub fn cache_put(&self, key: &str, body: &str, max_age: Duration) -> Result<()> {
        self.cache_put_at(key, body, max_age, Utc::now())
    }

    fn cache_put_at(&self, key: &str, body: &str, max_age: Duration, now: DateTime<Utc>) -> Result<()> {
        let max_age = chrono::Duration::from_std(max_age).context("cache max_age out of range")?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO http_cache (key, body, fetched_at) VALUES (?1, ?2, ?3)",
            params![key, body, cache_timestamp(now)],
        )
        .context("failed to write http cache")?;
        let pruned = conn
            .execute(
                "DELETE FROM http_cache WHERE fetched_at < ?1",
                params![cache_timestamp(now - max_age)],
            )
            .context("failed to prune http cache")?;
        if pruned > 0 {
            debug!("pruned {pruned} stale cache rows");
        }
        Ok(())
    }

    #[cfg(test)]
    fn cache_len(&self) -> Result<usize> {
        let conn = self.conn();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM http_cache", [], |row| row.get(0))
            .context("failed to count cache rows")?;
        Ok(n as usize)
    }

    // -----------------------------------------------------------------------
    // Ranking history
    // -----------------------------------------------------------------------

    /// Save a ranking and return its row id.
    pub fn record_run(
        &self,
        game_date: NaiveDate,
        matchup: &str,
        weights: &WeightSet,
        results: &[RankedHitter],
    ) -> Result<i64> {
        let weights_json = serde_json::to_string(weights).context("failed to serialize weights")?;
        let results_json = serde_json::to_string(results).context("failed to serialize results")?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO ranking_runs (created_at, game_date, matchup, weights_json, results_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Utc::now().to_rfc3339(),
                game_date.to_string(),
                matchup,
                weights_json,
                results_json,
            ],
        )
        .context("failed to record ranking run")?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent runs first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RankingRun>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, created_at, game_date, matchup, weights_json, results_json
                 FROM ranking_runs ORDER BY id DESC LIMIT ?1",
            )
            .context("failed to prepare recent_runs query")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .context("failed to query ranking runs")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map ranking run rows")?;

        rows.into_iter()
            .map(|(id, created_at, game_date, matchup, weights_json, results_json)| {
                Ok(RankingRun {
                    id,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .with_context(|| format!("bad created_at for run {id}"))?
                        .with_timezone(&Utc),
                    game_date: game_date
                        .parse()
                        .with_context(|| format!("bad game_date for run {id}"))?,
                    matchup,
                    weights: serde_json::from_str(&weights_json)
                        .with_context(|| format!("bad weights for run {id}"))?,
                    results: serde_json::from_str(&results_json)
                        .with_context(|| format!("bad results for run {id}"))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{StatKey, Weight};
    use crate::stats::Side;

    fn weights() -> WeightSet {
        WeightSet::new(vec![Weight {
            stat: StatKey::BarrelPct,
            weight: 0.5,
        }])
        .unwrap()
    }

    fn hitter(rank: usize, name: &str, score: f64) -> RankedHitter {
        RankedHitter {
            rank,
            name: name.into(),
            side: Side::Right,
            score,
            values: vec![score * 2.0],
        }
    }

    #[test]
    fn cache_returns_fresh_entries_only() {
        let store = Store::open(":memory:").unwrap();
        let then = Utc::now() - chrono::Duration::seconds(600);
        store
            .cache_put_at("schedule:2025-06-01", "{\"dates\":[]}", Duration::from_secs(3600), then)
            .unwrap();

        let fresh = store
            .cache_get("schedule:2025-06-01", Duration::from_secs(3600))
            .unwrap();
        assert_eq!(fresh.as_deref(), Some("{\"dates\":[]}"));

        let stale = store
            .cache_get("schedule:2025-06-01", Duration::from_secs(300))
            .unwrap();
        assert!(stale.is_none());
    }

    #[test]
    fn cache_put_overwrites() {
        let store = Store::open(":memory:").unwrap();
        store.cache_put("k", "one", Duration::from_secs(60)).unwrap();
        store.cache_put("k", "two", Duration::from_secs(60)).unwrap();
        let got = store.cache_get("k", Duration::from_secs(60)).unwrap();
        assert_eq!(got.as_deref(), Some("two"));
        assert!(store.cache_get("missing", Duration::from_secs(60)).unwrap().is_none());
    }

    #[test]
    fn cache_put_prunes_entries_past_max_age() {
        let store = Store::open(":memory:").unwrap();
        let now = Utc::now();
        let day = Duration::from_secs(86_400);
        let ttl = Duration::from_secs(300);
        store
            .cache_put_at("old", "a", day, now - chrono::Duration::seconds(900))
            .unwrap();
        store
            .cache_put_at("recent", "b", day, now - chrono::Duration::seconds(60))
            .unwrap();
        assert_eq!(store.cache_len().unwrap(), 2);

        store.cache_put_at("new", "c", ttl, now).unwrap();
        assert_eq!(store.cache_len().unwrap(), 2);
        assert!(store.cache_get_at("old", Duration::from_secs(3600), now).unwrap().is_none());
        assert_eq!(
            store.cache_get_at("recent", ttl, now).unwrap().as_deref(),
            Some("b")
        );
    }

    #[test]
    fn runs_round_trip_newest_first() {
        let store = Store::open(":memory:").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let first = store
            .record_run(date, "COL @ PHI", &weights(), &[hitter(1, "Kyle Schwarber", 9.9)])
            .unwrap();
        let second = store
            .record_run(date, "NYM @ ATL", &weights(), &[hitter(1, "Pete Alonso", 8.1)])
            .unwrap();
        assert!(second > first);

        let runs = store.recent_runs(10).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].matchup, "NYM @ ATL");
        assert_eq!(runs[1].results[0].name, "Kyle Schwarber");
        assert_eq!(runs[1].weights, weights());
        assert_eq!(runs[1].game_date, date);

        assert_eq!(store.recent_runs(1).unwrap().len(), 1);
    }
}
