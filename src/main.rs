use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use lichess_dashboard::config::{Config, EnvConfig};
use lichess_dashboard::data::lichess_api::LichessClient;
use lichess_dashboard::data::types::PerfType;
use lichess_dashboard::feed::aggregator::TournamentFeed;
use lichess_dashboard::view::render;

#[derive(Debug, Parser)]
#[command(version, about = "Lichess profiles, leaderboards and tournaments in the terminal")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show a player's profile
    Profile { username: String },

    /// Show the top players for a time control
    Leaderboard {
        /// bullet, blitz, rapid, classical or ultraBullet
        perf: Option<PerfType>,

        /// Number of players to list
        #[arg(long)]
        count: Option<u32>,

        /// Show every time control
        #[arg(long, conflicts_with = "perf")]
        all: bool,
    },

    /// Watch tournaments, refreshing on an interval
    Tournaments {
        /// Fetch once and exit
        #[arg(long)]
        once: bool,
    },

    /// Show the API status document
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env(&EnvConfig::load());
    info!("Using Lichess API at {}", config.api.base_url);

    let client = LichessClient::new(&config.api)?;

    match cli.command {
        Command::Profile { username } => show_profile(&client, &username).await,
        Command::Leaderboard { perf, count, all } => {
            let count = count.unwrap_or(config.leaderboard.default_count);
            if all {
                show_all_leaderboards(&client, count).await
            } else {
                let perf = perf.unwrap_or(config.leaderboard.default_perf);
                show_leaderboard(&client, perf, count).await
            }
        }
        Command::Tournaments { once } => {
            if once {
                show_tournaments_once(client, &config).await
            } else {
                watch_tournaments(client, &config).await
            }
        }
        Command::Status => show_status(&client).await,
    }
}

async fn show_profile(client: &LichessClient, username: &str) -> Result<ExitCode> {
    match client.fetch_user_profile(username).await {
        Ok(user) => {
            println!("{}", render::render_profile(&user, Utc::now()));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Error fetching profile for {}: {}", username, e);
            eprintln!("{}", render::profile_error_message(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_leaderboard(client: &LichessClient, perf: PerfType, count: u32) -> Result<ExitCode> {
    match client.fetch_leaderboard(perf, count).await {
        Ok(board) => {
            println!("{}", render::render_leaderboard(&board));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Error fetching leaderboard: {}", e);
            eprintln!("{}", render::LEADERBOARD_FAILED);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_all_leaderboards(client: &LichessClient, count: u32) -> Result<ExitCode> {
    match client.fetch_all_leaderboards(count).await {
        Ok(boards) => {
            let rendered: Vec<String> = boards.iter().map(render::render_leaderboard).collect();
            println!("{}", rendered.join("\n\n"));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Error fetching leaderboards: {}", e);
            eprintln!("{}", render::LEADERBOARD_FAILED);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_status(client: &LichessClient) -> Result<ExitCode> {
    match client.fetch_status().await {
        Ok(status) => {
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Error fetching API status: {}", e);
            eprintln!("{}", render::STATUS_FAILED);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_tournaments_once(client: LichessClient, config: &Config) -> Result<ExitCode> {
    let feed = TournamentFeed::new(Arc::new(client), config.feed.completed_limit);
    let result = feed.refresh().await;

    println!("{}", render::render_tournaments(&feed.snapshot(), Utc::now()));

    Ok(if result.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn watch_tournaments(client: LichessClient, config: &Config) -> Result<ExitCode> {
    let feed = TournamentFeed::new(Arc::new(client), config.feed.completed_limit);
    let handle = feed.spawn(config.feed.refresh_interval());
    let mut updates = handle.subscribe();
    let mut exit = ExitCode::SUCCESS;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Tournament feed ended unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                println!("{}", render::render_tournaments(&snapshot, Utc::now()));
            }
            signal = tokio::signal::ctrl_c() => {
                if !interrupted(signal) {
                    exit = ExitCode::FAILURE;
                }
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(exit)
}

/// Whether the Ctrl-C listener really saw the signal rather than failing to register.
fn interrupted(signal: std::io::Result<()>) -> bool {
    match signal {
        Ok(()) => {
            info!("Shutting down...");
            true
        }
        Err(e) => {
            warn!("Failed to listen for Ctrl-C, stopping the feed: {}", e);
            false
        }
    }
}
