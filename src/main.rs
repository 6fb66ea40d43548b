//! CLI entry point for the vehicle count dashboard.
//!
//! Queries every configured camera for a date range in parallel, then renders
//! the merged counts as a table and text bar charts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vehicle_counts::{
    config::{Config, parse_sources},
    dashboard::{Dashboard, LoadingState, SearchOutcome},
    fetch::BasicClient,
    model::{DateRange, SourceId, SourceState},
    output::{badge, print_json, render_bar_chart, render_status_line, render_table, write_csv},
};

#[derive(Parser)]
#[command(name = "vehicle_counts")]
#[command(about = "Vehicle counts across all cameras for a date range", long_about = None)]
struct Cli {
    /// Read endpoint base URL (overrides VEHICLE_COUNT_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Comma-separated camera ids (overrides VEHICLE_COUNT_SOURCES)
    #[arg(long, global = true, value_name = "IDS")]
    sources: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every camera and render the combined results
    Search {
        /// First day, YYYY-MM-DD or an RFC 3339 timestamp (default: today)
        #[arg(short, long)]
        start: Option<String>,

        /// Last day, YYYY-MM-DD or an RFC 3339 timestamp (default: today)
        #[arg(short, long)]
        end: Option<String>,

        /// Chart a single camera instead of all cameras combined
        #[arg(short, long)]
        camera: Option<u32>,

        /// Also render one panel per camera
        #[arg(long, default_value_t = false)]
        per_source: bool,

        /// Write the table to this CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Log the merged dataset as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Width of the longest chart bar, in characters
        #[arg(short, long, default_value_t = 40)]
        width: usize,
    },
    /// Show the configured endpoint and cameras
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vehicle_counts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vehicle_counts.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse::<Directive>()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse::<Directive>()?),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(raw) = cli.sources {
        config.sources = parse_sources(&raw).context("Invalid --sources")?;
    }

    match cli.command {
        Commands::Search {
            start,
            end,
            camera,
            per_source,
            csv,
            json,
            width,
        } => {
            let today = DateRange::today();
            let start = start.unwrap_or_else(|| today.start_param());
            let end = end.unwrap_or_else(|| today.stop_param());

            let mut dashboard = Dashboard::new(BasicClient::new(), config);

            let spinner = spawn_spinner(dashboard.loading());
            let outcome = dashboard.search(&start, &end).await;
            spinner.abort();
            clear_spinner();

            if let Some(notice) = outcome.notice() {
                println!("{}\n", notice.message());
            }

            print!("{}", render_status_line(outcome.statuses()));
            println!();
            print!("{}", render_table(&dashboard.table()));

            let (title, tab) = match camera {
                Some(id) => {
                    let id = SourceId(id);
                    if !dashboard.config().sources.contains(&id) {
                        warn!(camera = %id, "Camera is not in the configured source list");
                    }
                    (
                        format!("Vehicles by type and direction (camera {id})"),
                        dashboard.source_crosstab(id),
                    )
                }
                None => (
                    "Vehicles by type and direction (all cameras)".to_string(),
                    dashboard.crosstab(),
                ),
            };

            let chart = render_bar_chart(&title, &tab, width);
            if !chart.is_empty() {
                println!();
                print!("{chart}");
            }

            if per_source && !matches!(outcome, SearchOutcome::Failed(_)) {
                render_panels(&dashboard, &outcome, width);
            }

            if let Some(path) = csv {
                write_csv(&path, &dashboard.table())?;
                info!(path = %path.display(), "Table exported");
            }

            if json {
                print_json(dashboard.dataset())?;
            }
        }
        Commands::Sources => {
            println!("Endpoint: {}", config.base_url);
            println!("Type:     {}", config.source_type);
            let ids: Vec<String> = config.sources.iter().map(ToString::to_string).collect();
            println!("Cameras:  {}", ids.join(", "));
        }
    }

    Ok(())
}

/// One chart panel per configured camera, headed by its status badge.
fn render_panels(dashboard: &Dashboard<BasicClient>, outcome: &SearchOutcome, width: usize) {
    for &source in &dashboard.config().sources {
        let state = outcome
            .statuses()
            .iter()
            .find(|s| s.source == source)
            .map(|s| s.state.clone())
            .unwrap_or(SourceState::NoData);

        println!();
        println!("Camera {source} [{}]", badge(&state));

        let chart = render_bar_chart("", &dashboard.source_crosstab(source), width);
        if chart.is_empty() {
            println!("No data");
        } else {
            // skip the blank title line
            print!("{}", chart.trim_start_matches('\n'));
        }
    }
}

/// Draws a spinner on stderr while the search's loading flag is raised.
fn spawn_spinner(loading: LoadingState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !std::io::stderr().is_terminal() {
            return;
        }

        let frames = ['|', '/', '-', '\\'];
        let mut frame = 0;
        loop {
            if loading.is_loading() {
                eprint!("\r{} Searching all cameras...", frames[frame % frames.len()]);
                let _ = std::io::stderr().flush();
                frame += 1;
            }
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
    })
}

fn clear_spinner() {
    if std::io::stderr().is_terminal() {
        eprint!("\r\x1b[K");
        let _ = std::io::stderr().flush();
    }
}
