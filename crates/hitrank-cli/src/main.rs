// hitrank entry point.
//
// Every subcommand follows the same startup:
// 1. Initialize tracing (log to file, stdout stays for output)
// 2. Load config, copying defaults on first run
// 3. Open the SQLite store when the command needs it
// 4. Run the command and print its rendered output

mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use hitrank_core::config::{self, Config};
use hitrank_core::lineup::{find_lineups, LineupOptions};
use hitrank_core::report::{build_report, MatchupError, MatchupReport};
use hitrank_core::scoring::{Weight, WeightSet};
use hitrank_core::stats::StatTables;
use hitrank_core::store::Store;
use hitrank_core::teams;
use hitrank_feeds::drive;
use hitrank_feeds::statsapi::StatsApiClient;
use hitrank_feeds::weather::WeatherScraper;

#[derive(Parser)]
#[command(name = "hitrank")]
#[command(about = "Rank a matchup's hitters by a weighted score over Statcast tables")]
#[command(version)]
struct Cli {
    /// Game date (YYYY-MM-DD); defaults to today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Always fetch from the Stats API, bypassing the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Matchup {
    /// First team abbreviation, e.g. PHI
    team1: String,
    /// Second team abbreviation, e.g. COL
    team2: String,
}

#[derive(Subcommand)]
enum Command {
    /// Rank both lineups by the weighted score
    Rank {
        #[command(flatten)]
        matchup: Matchup,

        /// Weighted stat as LABEL=WEIGHT (repeatable, up to 4); overrides model.toml
        #[arg(long = "stat", value_name = "LABEL=WEIGHT")]
        stats: Vec<Weight>,

        /// Also look up the wind for this game
        #[arg(long)]
        weather: bool,

        /// Ignore substitutes
        #[arg(long)]
        starters_only: bool,

        /// Show only the best N hitters
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },

    /// Print the joined batter and pitcher stats
    Stats {
        #[command(flatten)]
        matchup: Matchup,

        #[arg(long)]
        starters_only: bool,
    },

    /// Print the posted lineups and probable pitchers
    Lineups {
        #[command(flatten)]
        matchup: Matchup,

        #[arg(long)]
        starters_only: bool,
    },

    /// Look up the wind for one game
    Weather {
        #[command(flatten)]
        matchup: Matchup,
    },

    /// Download the stat CSVs from the configured Drive file ids
    Update,

    /// Show recently saved rankings
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    info!("hitrank starting for {date}");

    let ctx = Session {
        config,
        date,
        no_cache: cli.no_cache,
    };

    match cli.command {
        Command::Rank {
            matchup,
            stats,
            weather,
            starters_only,
            top,
        } => ctx.rank(&matchup, stats, weather, LineupOptions { starters_only }, top).await,
        Command::Stats { matchup, starters_only } => {
            let store = ctx.store()?;
            let (report, _) = ctx.report(&store, &matchup, LineupOptions { starters_only }).await?;
            print!("{}", render::stats(&report));
            Ok(())
        }
        Command::Lineups { matchup, starters_only } => ctx.lineups(&matchup, LineupOptions { starters_only }).await,
        Command::Weather { matchup } => ctx.weather(&matchup).await,
        Command::Update => ctx.update().await,
        Command::History { limit } => {
            let store = ctx.store()?;
            let runs = store.recent_runs(limit).context("failed to read ranking history")?;
            print!("{}", render::history(&runs));
            Ok(())
        }
    }
}

/// Shared state for one invocation.
struct Session {
    config: Config,
    date: NaiveDate,
    no_cache: bool,
}

impl Session {
    fn store(&self) -> anyhow::Result<Arc<Store>> {
        let path = self.config.db_path();
        let store = Store::open(&path).context("failed to open database")?;
        info!("database opened at {}", path.display());
        Ok(Arc::new(store))
    }

    fn feed(&self, store: &Arc<Store>) -> anyhow::Result<StatsApiClient> {
        let client = StatsApiClient::from_config(&self.config)?;
        if self.no_cache {
            return Ok(client);
        }
        let ttl = Duration::from_secs(self.config.sources.cache.ttl_secs);
        Ok(client.with_cache(Arc::clone(store), ttl))
    }

    async fn report(
        &self,
        store: &Arc<Store>,
        matchup: &Matchup,
        opts: LineupOptions,
    ) -> anyhow::Result<(MatchupReport, StatTables)> {
        let tables = StatTables::load(&self.config.sources.data_paths).context("failed to load stat tables")?;
        let feed = self.feed(store)?;
        let report = build_report(
            &feed,
            &tables,
            &self.config.model.fallbacks,
            &matchup.team1,
            &matchup.team2,
            self.date,
            opts,
        )
        .await?;
        Ok((report, tables))
    }

    async fn rank(
        &self,
        matchup: &Matchup,
        stats: Vec<Weight>,
        with_weather: bool,
        opts: LineupOptions,
        top: Option<usize>,
    ) -> anyhow::Result<()> {
        let weights = if stats.is_empty() {
            self.config.weight_set().context("invalid weights in model.toml")?
        } else {
            WeightSet::new(stats).context("invalid --stat weights")?
        };

        let store = self.store()?;
        let (report, tables) = self.report(&store, matchup, opts).await?;
        let title = format!("{}, {}", report.label(), report.date);
        if report.empty_lineups {
            println!("{title}: lineups not yet posted.");
            return Ok(());
        }

        let ranked = report.rank(&tables.handedness, &weights);
        print!("{}", render::ranking(&title, &weights, &ranked, top));

        if with_weather {
            println!("{}", self.lookup_weather(matchup).await);
        }

        let id = store
            .record_run(report.date, &report.label(), &weights, &ranked)
            .context("failed to save ranking")?;
        info!("saved ranking run {id}");
        Ok(())
    }

    async fn lineups(&self, matchup: &Matchup, opts: LineupOptions) -> anyhow::Result<()> {
        let t1 = teams::lookup(&matchup.team1)?;
        let t2 = teams::lookup(&matchup.team2)?;
        let store = self.store()?;
        let feed = self.feed(&store)?;
        let lineups = find_lineups(&feed, t1, t2, self.date, opts)
            .await?
            .ok_or_else(|| MatchupError::NoGame {
                team1: t1.abbr.to_string(),
                team2: t2.abbr.to_string(),
            })?;
        print!("{}", render::lineups(&lineups));
        Ok(())
    }

    /// The wind line for a ranking. Never fails.
    async fn lookup_weather(&self, matchup: &Matchup) -> String {
        weather_line(self.fetch_weather(matchup).await)
    }

    async fn fetch_weather(&self, matchup: &Matchup) -> anyhow::Result<String> {
        let t1 = teams::lookup(&matchup.team1)?;
        let t2 = teams::lookup(&matchup.team2)?;
        let scraper = WeatherScraper::from_config(&self.config)?;
        let game = scraper.lookup(t1, t2).await?;
        Ok(render::weather(game.as_ref()))
    }

    async fn weather(&self, matchup: &Matchup) -> anyhow::Result<()> {
        println!("{}", self.fetch_weather(matchup).await?);
        Ok(())
    }

    async fn update(&self) -> anyhow::Result<()> {
        let outcomes = drive::update_all(&self.config).await?;
        print!("{}", render::updates(&outcomes));
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        if failed > 0 {
            bail!("{failed} of {} downloads failed", outcomes.len());
        }
        Ok(())
    }
}

/// A failed weather lookup degrades to "weather unavailable".
fn weather_line(lookup: anyhow::Result<String>) -> String {
    match lookup {
        Ok(line) => line,
        Err(e) => {
            warn!("weather lookup failed: {e:#}");
            render::weather(None)
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // stdout carries the rendered tables, so logs go to a file
    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("hitrank.log"))?;

    let subscriber = fmt::Subscriber::builder()
        // RUST_LOG overrides the default filter
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hitrank=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use hitrank_core::scoring::StatKey;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rank_parses_weights_and_flags() {
        let cli = Cli::try_parse_from([
            "hitrank",
            "rank",
            "PHI",
            "COL",
            "--stat",
            "Barrel %=0.3",
            "--stat",
            "xslg=0.2",
            "--top",
            "5",
            "--date",
            "2025-06-01",
            "--no-cache",
        ])
        .unwrap();
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert!(cli.no_cache);
        let Command::Rank { matchup, stats, weather, starters_only, top } = cli.command else {
            panic!("expected rank");
        };
        assert_eq!(matchup.team1, "PHI");
        assert_eq!(matchup.team2, "COL");
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].stat, StatKey::BarrelPct);
        assert_eq!(stats[1].weight, 0.2);
        assert!(!weather && !starters_only);
        assert_eq!(top, Some(5));
    }

    #[test]
    fn bad_stat_and_date_are_rejected() {
        assert!(Cli::try_parse_from(["hitrank", "rank", "PHI", "COL", "--stat", "wOBA=0.5"]).is_err());
        assert!(Cli::try_parse_from(["hitrank", "--date", "06/01/2025", "history"]).is_err());
    }

    #[test]
    fn weather_failure_degrades_to_unavailable() {
        let failed: anyhow::Result<String> = Err(anyhow::anyhow!("connection refused"));
        assert_eq!(weather_line(failed), "weather unavailable");
        assert_eq!(
            weather_line(Ok("Wind: 14 mph Out to RF (blowing out)".into())),
            "Wind: 14 mph Out to RF (blowing out)"
        );
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["hitrank", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { limit: 10 }));
    }
}
