//! Summit Seekers command-line client.
//!
//! Log in with Strava and browse activities, peaks, challenges, groups and
//! goals from the terminal.

mod activity_commands;
mod auth_commands;
mod challenge_commands;
mod config_commands;
mod goal_commands;
mod group_commands;
mod output;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use summit_core::{Database, Session, Settings, SqliteStorage};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "summit", version, about = "Summit Seekers - Strava hike and summit tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Print command results as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Backend base URL for this invocation.
    #[arg(long, global = true, env = "SUMMIT_BASE_URL")]
    base_url: Option<String>,

    /// Path to the local database.
    #[arg(long, global = true, env = "SUMMIT_DATABASE")]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Settings management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    #[command(flatten)]
    Session(SessionCommands),
}

/// Commands that run against the backend session.
#[derive(Subcommand)]
enum SessionCommands {
    /// Log in with Strava.
    Login {
        /// Do not try to open a browser; just print the authorization URL.
        #[arg(long)]
        no_browser: bool,
        /// Redirect URL (or query string) to complete the login with,
        /// instead of reading it from stdin.
        #[arg(long)]
        callback: Option<String>,
    },
    /// Forget stored tokens.
    Logout,
    /// Show login state and configuration.
    Status,
    /// Your activities.
    Activities(activity_commands::ListArgs),
    /// Hike Gang shared activities.
    HikeGang {
        #[command(subcommand)]
        action: activity_commands::HikeGangAction,
    },
    /// Peaks and summit summaries.
    Peaks(activity_commands::PeakArgs),
    /// Favourite peaks.
    Favourites {
        #[command(subcommand)]
        action: goal_commands::FavouriteAction,
    },
    /// Peak-bagging challenges.
    Challenges {
        #[command(subcommand)]
        action: challenge_commands::ChallengeAction,
    },
    /// Groups, members and group goals.
    Groups {
        #[command(subcommand)]
        action: group_commands::GroupAction,
    },
    /// Personal yearly goals.
    Goals {
        #[command(subcommand)]
        action: goal_commands::GoalAction,
    },
    /// Shared distance goal progress.
    Progress,
    /// Your profile.
    Profile,
}

fn init_telemetry(cli: &Cli) {
    // Our crates follow --log-level; dependencies stay quiet unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &cli.log_level;
        EnvFilter::new(format!("warn,summit={level},summit_core={level}"))
    });

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn open_database(path: Option<PathBuf>) -> Result<Database> {
    let db = match path {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    db.migrate().context("Failed to migrate database")?;
    Ok(db)
}

/// Everything a command needs: the wired-up session and output mode.
pub struct Context {
    pub session: Session,
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    info!("Starting Summit Seekers v{}", summit_core::VERSION);

    let db = open_database(cli.database.clone())?;

    let command = match cli.command {
        // Settings commands edit the database directly
        Commands::Config { action } => {
            return config_commands::handle_config(action, &db, cli.json);
        }
        Commands::Session(command) => command,
    };

    let mut settings = Settings::load(&db);
    if let Some(base_url) = &cli.base_url {
        settings.api_base_url = base_url.clone();
        settings.validate();
    }

    let storage = Arc::new(SqliteStorage::new(db)?);
    let ctx = Context {
        session: Session::new(settings, storage)?,
        json: cli.json,
    };
    run(&ctx, command).await
}

async fn run(ctx: &Context, command: SessionCommands) -> Result<()> {
    match command {
        SessionCommands::Login {
            no_browser,
            callback,
        } => auth_commands::login(ctx, no_browser, callback).await,
        SessionCommands::Logout => auth_commands::logout(ctx),
        SessionCommands::Status => auth_commands::status(ctx),
        SessionCommands::Profile => auth_commands::profile(ctx).await,
        SessionCommands::Activities(args) => activity_commands::list_activities(ctx, args).await,
        SessionCommands::HikeGang { action } => {
            activity_commands::handle_hike_gang(ctx, action).await
        }
        SessionCommands::Peaks(args) => activity_commands::list_peaks(ctx, args).await,
        SessionCommands::Favourites { action } => {
            goal_commands::handle_favourites(ctx, action).await
        }
        SessionCommands::Challenges { action } => {
            challenge_commands::handle_challenges(ctx, action).await
        }
        SessionCommands::Groups { action } => group_commands::handle_groups(ctx, action).await,
        SessionCommands::Goals { action } => goal_commands::handle_goals(ctx, action).await,
        SessionCommands::Progress => goal_commands::progress(ctx).await,
    }
}
