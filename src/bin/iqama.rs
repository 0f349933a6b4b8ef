//! CLI binary for iqama.

use clap::{Parser, Subcommand};
use iqama::schedule::{compile, jumuah_window_for, SceneKind};
use iqama::{ObsClient, Switcher, SwitcherConfig};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Iqama: automatic OBS scene switching around daily prayer times.
#[derive(Parser)]
#[command(name = "iqama", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the switcher until interrupted.
    Run,

    /// Scrape today's iqama times and print the remaining switches.
    Times,

    /// Switch to the prayer scene and back once, to check OBS wiring.
    Test {
        /// Seconds to hold the prayer scene.
        #[arg(long, default_value_t = 10)]
        hold_seconds: u64,
    },

    /// Write a default configuration file.
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before config so OBS_* overrides are visible.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::InitConfig => init_config(cli.config),
        Command::Run => {
            let (config, _guard) = load_config(cli.config.as_deref())?;
            run_switcher(config).await
        }
        Command::Times => {
            let (config, _guard) = load_config(cli.config.as_deref())?;
            show_times(config).await
        }
        Command::Test { hold_seconds } => {
            let (config, _guard) = load_config(cli.config.as_deref())?;
            run_test(config, hold_seconds).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<(SwitcherConfig, Option<WorkerGuard>)> {
    let mut config = SwitcherConfig::load(path)?;
    config.apply_env()?;
    config.validate()?;
    let guard = iqama::logging::init(&config.log)?;
    Ok((config, guard))
}

async fn run_switcher(config: SwitcherConfig) -> anyhow::Result<()> {
    println!("iqama v{}", env!("CARGO_PKG_VERSION"));

    let switcher = Switcher::new(config)?;
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    switcher.run(cancel).await?;
    Ok(())
}

async fn show_times(config: SwitcherConfig) -> anyhow::Result<()> {
    let tz = config.schedule.tz()?;
    let now = chrono::Utc::now().with_timezone(&tz);
    let day = now.date_naive();

    println!("Scraping {} ...", config.scrape.url);
    let scraped = iqama_scrape::fetch_iqama_times(&config.scrape).await?;
    if scraped.is_empty() {
        println!("No iqama times found on the slides page.");
    } else {
        for (prayer, time) in &scraped {
            println!("  {:<8} {}", prayer.name(), time.format("%-I:%M %p"));
        }
    }

    let manual = config.schedule.manual_fallback()?;
    let window = jumuah_window_for(day, &config.jumuah)?;
    let duration = chrono::Duration::minutes(i64::from(config.scenes.prayer_duration_minutes));
    let actions = compile(day, now, &scraped, &manual, window.as_ref(), duration);

    if actions.is_empty() {
        println!("\nNo scene switches left today.");
    } else {
        println!("\nRemaining switches today ({}):", day.format("%A %B %-d"));
        for action in &actions {
            let scene = match action.scene {
                SceneKind::Prayer => &config.scenes.prayer,
                SceneKind::Default => &config.scenes.default,
            };
            println!(
                "  {}  {:<14} -> {}",
                action.at.format("%H:%M:%S"),
                action.trigger,
                scene
            );
        }
    }
    Ok(())
}

async fn run_test(config: SwitcherConfig, hold_seconds: u64) -> anyhow::Result<()> {
    let obs = ObsClient::new(config.obs.clone());
    let version = obs.check_connection().await?;
    println!("Connected to OBS {version}.");

    println!("Switching to \"{}\" in 3 seconds...", config.scenes.prayer);
    for i in (1..=3).rev() {
        println!("  {i}...");
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    obs.set_scene(&config.scenes.prayer).await?;
    println!("Holding for {hold_seconds}s...");
    tokio::time::sleep(std::time::Duration::from_secs(hold_seconds)).await;

    obs.set_scene(&config.scenes.default).await?;
    println!("Restored \"{}\".", config.scenes.default);
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(SwitcherConfig::default_config_path);
    if path.exists() {
        anyhow::bail!("{} already exists, not overwriting", path.display());
    }
    SwitcherConfig::default().save_to_file(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
