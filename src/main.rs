//! Groovewatch - record listing watcher
//!
//! Polls a marketplace search, scores new vinyl listings and prints the
//! ones worth a look.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use groovewatch::app::WatchOptions;
use groovewatch::config::{self, TunePatch};
use groovewatch::events::OutputFormat;
use groovewatch::App;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "groovewatch", version, about = "Watch marketplace listings for records worth buying")]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "GROOVEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `groovewatch=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for new listings
    Watch(WatchArgs),
    /// Change scoring thresholds in the config file
    Tune(TuneArgs),
    /// Offline wiring check with built-in listings
    Smoke {
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Write a sample config file if none exists
    Init,
}

#[derive(Args)]
struct WatchArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Read listings from a JSON file instead of the marketplace
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Seconds between cycles
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Also print rejected listings
    #[arg(long)]
    emit_rejects: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TuneArgs {
    #[arg(long, value_name = "BOOL")]
    end_soon_enabled: Option<bool>,

    #[arg(long, value_name = "N")]
    minutes_window: Option<u32>,

    #[arg(long, value_name = "F")]
    candidate_floor: Option<f64>,

    #[arg(long, value_name = "F")]
    auto_match_threshold: Option<f64>,
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

/// Console layer on stderr plus a daily rolling file in the log directory.
fn init_logging(level: Option<&str>) -> Option<WorkerGuard> {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "groovewatch=info".into()),
    };

    let (file_layer, guard) = match config::log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "groovewatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Watch(args) => {
            let app = App::from_file(&config_path).with_context(|| {
                format!(
                    "cannot load config {} (run `groovewatch init` to create one)",
                    config_path.display()
                )
            })?;
            let options = WatchOptions {
                once: args.once,
                fixture: args.fixture,
                interval_secs: args.interval,
                emit_rejects: args.emit_rejects,
                format: output_format(args.json),
                deal_log: config::log_dir().ok().map(|dir| dir.join("deals.log")),
            };
            app.watch(&options).await?;
        }
        Commands::Tune(args) => {
            let patch = TunePatch {
                end_soon_enabled: args.end_soon_enabled,
                minutes_window: args.minutes_window,
                candidate_floor: args.candidate_floor,
                auto_match_threshold: args.auto_match_threshold,
            };
            let config = App::tune(&config_path, &patch)
                .with_context(|| format!("cannot tune {}", config_path.display()))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Smoke { json } => {
            let report = App::smoke(output_format(json)).await.context("smoke run failed")?;
            println!("smoke OK: {report}");
        }
        Commands::Init => {
            if App::init(&config_path)? {
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists", config_path.display());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
