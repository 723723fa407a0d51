use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labtrend::aliases::AliasTable;
use labtrend::config::AppConfig;
use labtrend::db::PgHistory;
use labtrend::{compare, pipeline, report, trend};
use labtrend::{HistoryStore, PanelParser, ReferenceCatalog};

#[derive(Parser)]
#[command(name = "labtrend")]
#[command(about = "Extract lab values from report text and track them over time", long_about = None)]
struct Cli {
    /// Reference range catalog (overrides LAB_RANGES_PATH)
    #[arg(long, global = true)]
    ranges: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// List the tests the catalog can recognize
    Tests,
    /// Analyze a report and record it in the user's history
    Analyze {
        #[arg(long)]
        user: String,
        /// Label stored with the session; defaults to the first file name
        #[arg(long)]
        label: Option<String>,
        /// Text segments of the report, one file per page
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },
    /// Show the most recent sessions
    History {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
        limit: u32,
    },
    /// Trend for one test
    Trend {
        #[arg(long)]
        user: String,
        #[arg(long)]
        test: String,
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=60))]
        months: u32,
    },
    /// Compare the two most recent sessions
    Compare {
        #[arg(long)]
        user: String,
    },
    /// Aggregate statistics for a user
    Stats {
        #[arg(long)]
        user: String,
    },
    /// Write a markdown report
    Report {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct HistoryView<'a> {
    user_stats: labtrend::models::UserStats,
    history: &'a [labtrend::models::TestSession],
    total_sessions: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labtrend=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let ranges_path = cli.ranges.unwrap_or_else(|| config.ranges_path.clone());
    let parser = PanelParser::load(&ranges_path, &AliasTable::builtin())
        .context("failed to load reference ranges")?;

    match cli.command {
        Commands::Tests => print_available(parser.catalog()),
        command => run(command, &parser, &config).await,
    }
}

fn print_available(catalog: &ReferenceCatalog) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Available<'a> {
        available_tests: Vec<&'a str>,
        total_tests: usize,
    }
    print_json(&Available {
        available_tests: catalog.names(),
        total_tests: catalog.len(),
    })
}

async fn run(
    command: Commands,
    parser: &PanelParser,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let store = PgHistory::connect(config.database_url()?, config.max_connections)
        .await
        .context("failed to connect to Postgres")?;

    match command {
        Commands::Tests => print_available(parser.catalog())?,
        Commands::InitDb => {
            store.init_db().await?;
            println!("Schema ready.");
        }
        Commands::Analyze {
            user,
            label,
            segments,
        } => {
            let mut pages = Vec::with_capacity(segments.len());
            for path in &segments {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                pages.push(text);
            }
            let label = label
                .or_else(|| {
                    segments
                        .first()
                        .and_then(|path| path.file_name())
                        .map(|name| name.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "document".to_string());

            let outcome = pipeline::analyze_document(parser, &store, &user, &label, pages).await?;
            print_json(&outcome)?;
        }
        Commands::History { user, limit } => {
            let history = store.list_sessions(&user, limit as usize).await?;
            let user_stats = store.user_stats(&user).await?;
            print_json(&HistoryView {
                user_stats,
                total_sessions: history.len(),
                history: &history,
            })?;
        }
        Commands::Trend { user, test, months } => {
            let report = trend::analyze_trend(&store, parser.catalog(), &user, &test, months).await?;
            print_json(&report)?;
        }
        Commands::Compare { user } => {
            let report = compare::compare_latest_two(&store, &user).await?;
            print_json(&report)?;
        }
        Commands::Stats { user } => {
            print_json(&store.user_stats(&user).await?)?;
        }
        Commands::Report { user, out } => {
            let user_stats = store.user_stats(&user).await?;
            let sessions = store.list_sessions(&user, 10).await?;
            let comparison = compare::compare_latest_two(&store, &user).await?;
            let markdown = report::build_report(&user, &user_stats, &sessions, &comparison);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
