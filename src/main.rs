use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use wavelight::cache::{CacheBackend, DiskBackend, MemoryBackend};
use wavelight::leaderboard::{LeaderboardMode, LeaderboardQuery, DEFAULT_PER_PAGE};
use wavelight::output;
use wavelight::results::{NewResult, ResultPatch};
use wavelight::store::{SqliteStore, StoreError};
use wavelight::tracker::Tracker;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_STORE: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Record a result
    Add {
        athlete: String,
        event: String,
        result: String,
        /// Meet name (defaults to the date as YYYYMMDD)
        #[arg(short, long)]
        meet: Option<String>,
        /// Use the meet of the last recorded result
        #[arg(long, conflicts_with = "meet")]
        last_meet: bool,
        /// Team (defaults to the athlete's most recent team)
        #[arg(short, long)]
        team: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Record even if an identical result exists
        #[arg(long)]
        allow_duplicate: bool,
    },
    /// Correct fields of a recorded result
    Edit {
        id: i64,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        athlete: Option<String>,
        #[arg(long)]
        meet: Option<String>,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },
    /// Delete a recorded result
    Delete { id: i64 },
    /// Rename every result of a meet
    RenameMeet { from: String, to: String },
    /// Strip leading zeros from minute fields ("04:32.10" -> "4:32.10")
    Normalize {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Placings, relays, team scores and rank movement for a meet
    Meet {
        name: String,
        /// Discard cached scores and rankings first
        #[arg(long)]
        recompute: bool,
    },
    /// Rank athletes in an event over the trailing window
    Rank {
        event: String,
        /// Rank as of this date (defaults to today)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Leave out results on the date itself
        #[arg(long)]
        before: bool,
    },
    /// Best marks in an event
    Leaderboard {
        event: String,
        #[arg(short, long)]
        team: Option<String>,
        #[arg(short, long)]
        athlete: Option<String>,
        /// Every mark instead of one per athlete
        #[arg(long)]
        all: bool,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Events with athlete and result counts
    Events,
    /// An athlete's results, bests and relays
    Athlete {
        name: String,
        /// Date the 12-month bests end on (defaults to today)
        #[arg(long, value_parser = parse_date)]
        as_of: Option<NaiveDate>,
    },
    /// A team's results and best marks
    Team { name: String },
    /// Teams with athlete and result counts
    Teams,
    /// Most recently dated results
    Recent {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Parser, Debug)]
#[command(name = "wavelight")]
#[command(about = "Track and field results: rankings, relays and meet scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file (defaults to ~/.config/wavelight/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the results database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Keep derived views in memory for this run only
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("WAVELIGHT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Store failures other than a missing id exit with EXIT_STORE.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<StoreError>() {
        Some(StoreError::NotFound { .. }) | None => EXIT_FAILURE,
        Some(_) => EXIT_STORE,
    }
}

fn emit<T: Serialize>(value: &T, json: bool, render: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialize output")?
        );
    } else {
        println!("{}", render(value));
    }
    Ok(())
}

fn run(tracker: &Tracker<SqliteStore>, command: Commands, json: bool) -> Result<()> {
    let use_colors = !json && output::should_use_colors();

    match command {
        Commands::Init { .. } => anyhow::bail!("init runs before the database is opened"),
        Commands::Add {
            athlete,
            event,
            result,
            meet,
            last_meet,
            team,
            date,
            allow_duplicate,
        } => {
            let team = match team {
                Some(team) => team,
                None => tracker.latest_team(&athlete)?.with_context(|| {
                    format!("No team on record for '{}'; pass --team", athlete)
                })?,
            };
            let meet = if last_meet {
                tracker
                    .last_meet()?
                    .context("No results recorded yet; pass --meet")?
            } else {
                meet.unwrap_or_default()
            };

            let new = NewResult {
                date: date.unwrap_or_else(today),
                athlete,
                meet,
                event,
                result,
                team,
            };
            let row = tracker.add_result(new, allow_duplicate)?;
            emit(&row, json, |r| {
                output::format_results(std::slice::from_ref(r), use_colors)
            })
        }
        Commands::Edit {
            id,
            date,
            athlete,
            meet,
            event,
            result,
            team,
        } => {
            let patch = ResultPatch {
                date,
                athlete,
                meet,
                event,
                result,
                team,
            };
            let row = tracker.update_result(id, &patch)?;
            emit(&row, json, |r| {
                output::format_results(std::slice::from_ref(r), use_colors)
            })
        }
        Commands::Delete { id } => {
            let row = tracker.delete_result(id)?;
            emit(&row, json, |r| {
                format!(
                    "Deleted {}",
                    output::format_results(std::slice::from_ref(r), use_colors)
                )
            })
        }
        Commands::RenameMeet { from, to } => {
            let changed = tracker.rename_meet(&from, &to)?;
            emit(&changed, json, |n| {
                format!("Renamed {} results from '{}' to '{}'", n, from, to.trim())
            })
        }
        Commands::Normalize { dry_run } => {
            let changes = tracker.normalize(dry_run)?;
            emit(&changes, json, |c| output::format_normalized(c, dry_run, use_colors))
        }
        Commands::Meet { name, recompute } => {
            let report = tracker.meet_report(&name, recompute)?;
            emit(&report, json, |r| output::format_meet_report(r, use_colors))
        }
        Commands::Rank {
            event,
            date,
            before,
        } => {
            let rankings = tracker.rankings(&event, date.unwrap_or_else(today), !before)?;
            emit(&rankings, json, |r| output::format_rankings(r, use_colors))
        }
        Commands::Leaderboard {
            event,
            team,
            athlete,
            all,
            page,
            per_page,
        } => {
            let query = LeaderboardQuery {
                event,
                team,
                athlete,
                mode: if all {
                    LeaderboardMode::All
                } else {
                    LeaderboardMode::Best
                },
                page,
                per_page,
            };
            let board = tracker.leaderboard(&query)?;
            emit(&board, json, |b| output::format_leaderboard(b, use_colors))
        }
        Commands::Events => {
            let events = tracker.events()?;
            emit(&events, json, |e| output::format_event_summaries(e, use_colors))
        }
        Commands::Athlete { name, as_of } => {
            let profile = tracker.athlete_profile(&name, as_of.unwrap_or_else(today))?;
            emit(&profile, json, |p| output::format_athlete_profile(p, use_colors))
        }
        Commands::Team { name } => {
            let profile = tracker.team_profile(&name)?;
            emit(&profile, json, |p| output::format_team_profile(p, use_colors))
        }
        Commands::Teams => {
            let teams = tracker.teams()?;
            emit(&teams, json, |t| output::format_team_summaries(t, use_colors))
        }
        Commands::Recent { limit } => {
            let rows = tracker.recent(limit)?;
            emit(&rows, json, |r| output::format_results(r, use_colors))
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    if let Err(e) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("{}", e);
    }

    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init { force } = cli.command {
        let path = config_path.unwrap_or_else(wavelight::config::get_config_path);
        match wavelight::config::write_default_config(&path, force) {
            Ok(()) => {
                println!("Wrote default config to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    let config = match wavelight::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = wavelight::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let db_path = cli
        .db
        .or_else(|| config.database.clone())
        .unwrap_or_else(wavelight::config::get_database_path);

    if let Err(e) = wavelight::config::ensure_parent_dir(&db_path) {
        eprintln!("Store error: {:#}", e);
        std::process::exit(EXIT_STORE);
    }

    let store = match SqliteStore::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Store error: {}", e);
            std::process::exit(EXIT_STORE);
        }
    };

    let backend: Arc<dyn CacheBackend> = if cli.no_cache {
        Arc::new(MemoryBackend::new())
    } else {
        Arc::new(DiskBackend::new(wavelight::config::get_cache_path()))
    };

    let tracker = match Tracker::new(store, config, backend) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let code = match run(&tracker, cli.command, cli.json) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };

    tracing::debug!(elapsed = ?start_time.elapsed(), "done");
    // Drop the tracker so the connection closes before exiting
    drop(tracker);
    std::process::exit(code);
}
