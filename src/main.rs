//! stridelog - log runs and rides on a map

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use stridelog::app::{AppController, AppEvent, FormValues, ListEntry};
use stridelog::config::{Config, parse_coords, parse_zoom};
use stridelog::console::{ConsoleView, DetachedMap, PresetForm, format_entry};
use stridelog::db::Database;
use stridelog::error::GeolocationError;
use stridelog::map::MapController;
use stridelog::position::{FixedPosition, Geolocation};
use stridelog::stats::Analytics;
use stridelog::store::WorkoutStore;
use stridelog::tui::App;
use stridelog::{Coords, WorkoutType};

#[derive(Parser)]
#[command(name = "stridelog")]
#[command(author, version, about = "Log runs and rides on a map")]
struct Cli {
    /// SQLite database file (overrides STRIDELOG_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Your position as "lat,lng" (overrides STRIDELOG_HOME)
    #[arg(long, global = true, allow_hyphen_values = true)]
    home: Option<String>,

    /// Map zoom level (overrides STRIDELOG_ZOOM)
    #[arg(long, global = true)]
    zoom: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the map dashboard
    Tui,

    /// Log a workout at a position without opening the dashboard
    Log {
        #[arg(value_enum)]
        kind: KindArg,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Distance in km
        #[arg(short, long)]
        distance: String,

        /// Duration in minutes
        #[arg(short = 't', long)]
        duration: String,

        /// Steps per minute (running)
        #[arg(short, long, default_value = "")]
        cadence: String,

        /// Elevation gain in meters (cycling)
        #[arg(short, long, default_value = "")]
        elevation: String,
    },

    /// List stored workouts
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show totals per workout type
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Running,
    Cycling,
}

impl From<KindArg> for WorkoutType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Running => WorkoutType::Running,
            KindArg::Cycling => WorkoutType::Cycling,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(home) = cli.home.as_deref() {
        config.home = Some(parse_coords("--home", home)?);
    }
    if let Some(zoom) = cli.zoom.as_deref() {
        config.zoom = parse_zoom("--zoom", zoom)?;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    let to_file = matches!(command, Commands::Tui);
    init_tracing(to_file.then_some(config.log_path.as_str()))?;

    match command {
        Commands::Tui => {
            let db = Database::open(&config.db_path)?;
            let mut app = App::new(db, &config, &mut FixedPosition::new(config.home));
            app.run()?;
        }

        Commands::Log { kind, lat, lng, distance, duration, cadence, elevation } => {
            let values = FormValues {
                kind: kind.into(),
                distance,
                duration,
                cadence,
                elevation,
            };
            log_workout(&config, values, Coords::new(lat, lng)).await?;
        }

        Commands::List { limit } => {
            let store = WorkoutStore::new(Database::open(&config.db_path)?);
            let workouts = store.load();
            println!("Recent workouts:");
            println!("{:-<72}", "");
            for w in workouts.iter().rev().take(limit) {
                println!(
                    "{} | {:20} | {}",
                    w.date().format("%Y-%m-%d %H:%M"),
                    w.description(),
                    format_entry(&ListEntry::from(w))
                );
            }
        }

        Commands::Stats => {
            let store = WorkoutStore::new(Database::open(&config.db_path)?);
            let workouts = store.load();
            let analytics = Analytics::new(&workouts);

            println!("Workout statistics");
            println!("{:-<40}", "");
            for s in analytics.summaries() {
                let rate = match (s.kind, s.average_rate) {
                    (WorkoutType::Running, Some(pace)) => format!("{:.1} min/km", pace),
                    (WorkoutType::Cycling, Some(speed)) => format!("{:.1} km/h", speed),
                    (_, None) => "-".to_string(),
                };
                println!(
                    "{} {:8} {:>3} sessions | {:>7.1} km | {:>6.0} min | {}",
                    s.kind.icon(),
                    s.kind.label(),
                    s.count,
                    s.total_distance,
                    s.total_duration,
                    rate
                );
            }
            println!("Weekly frequency: {:.1} sessions/week", analytics.weekly_frequency());
        }
    }

    Ok(())
}

/// Run the regular create flow: locate at `at`, click there, submit `values`
async fn log_workout(config: &Config, values: FormValues, at: Coords) -> Result<()> {
    let db = Database::open(&config.db_path)?;
    let mut app = AppController::new(
        MapController::new(DetachedMap::default(), config.zoom),
        PresetForm::new(values),
        ConsoleView::default(),
        WorkoutStore::new(db),
    );
    app.start();

    let position = FixedPosition::new(Some(at))
        .request_once()
        .await
        .unwrap_or(Err(GeolocationError::Dropped));
    app.handle(AppEvent::Position(position));
    app.handle(AppEvent::MapClicked(at));

    match app.submit() {
        Ok(id) => {
            if let Some(entry) = app.view().entries.last() {
                println!("Logged: {} - {} (id: {})", entry.title, format_entry(entry), id);
            }
            Ok(())
        }
        Err(e) => {
            for notice in &app.view().notices {
                eprintln!("{}", notice);
            }
            Err(e.into())
        }
    }
}

/// Log to `log_path` when given (the TUI owns the terminal), stderr otherwise.
/// `RUST_LOG` overrides the default level.
fn init_tracing(log_path: Option<&str>) -> Result<()> {
    let default_level = if log_path.is_some() { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    match log_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
