mod db;
mod error;
mod fetch;
mod pacing;
mod parser;
mod pipeline;
mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use db::RecordStore;
use fetch::HttpFetcher;
use pacing::Pacing;
use pipeline::{Pipeline, Source};
use settings::Settings;

#[derive(Parser)]
#[command(name = "planning_notices", about = "Development applications on public notification")]
struct Cli {
    /// Config file (default: ./planning_notices.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the listing and store every application not seen before
    Run {
        /// Listing page to start from
        #[arg(long)]
        listing_url: Option<String>,
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Minimum pause before each detail request
        #[arg(long)]
        min_delay_ms: Option<u64>,
        /// Random extra pause, up to this many milliseconds
        #[arg(long)]
        jitter_ms: Option<u64>,
    },
    /// Show row counts
    Stats {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// One application as JSON
    Show {
        /// Council reference, e.g. 100/2020
        reference: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Most recently scraped applications
    List {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run {
            listing_url,
            db,
            min_delay_ms,
            jitter_ms,
        } => {
            settings.apply_run_overrides(listing_url, db, min_delay_ms, jitter_ms);

            let store = open_store(&settings)?;
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let source = Source {
                listing_url: settings.listing_url.clone(),
                listing_selector: settings.listing_selector.clone(),
                comment_url: settings.comment_url.clone(),
            };
            let today = chrono::Local::now().date_naive();

            let stats = Pipeline::new(
                &fetcher,
                &store,
                Pacing::from(&settings.pacing),
                &source,
                today,
            )
            .run()
            .await?;

            println!(
                "Done: {} listed, {} inserted, {} already present, {} skipped, {} failed.",
                stats.listed,
                stats.inserted,
                stats.existing,
                stats.skipped,
                stats.fetch_failed + stats.store_failed,
            );
            Ok(())
        }
        Commands::Stats { db } => {
            if let Some(path) = db {
                settings.db_path = path;
            }
            let store = open_store(&settings)?;
            let total = store.count()?;
            let dates = store.date_counts()?;
            println!("Applications:   {}", total);
            println!("Date received:  {}", dates.received);
            println!("Notice from:    {}", dates.notice_from);
            println!("Notice to:      {}", dates.notice_to);
            Ok(())
        }
        Commands::Show { reference, db } => {
            if let Some(path) = db {
                settings.db_path = path;
            }
            let store = open_store(&settings)?;
            match store.get(&reference)? {
                Some(r) => println!("{}", serde_json::to_string_pretty(&r)?),
                None => println!("No application with reference {:?}.", reference),
            }
            Ok(())
        }
        Commands::List { db, limit, json } => {
            if let Some(path) = db {
                settings.db_path = path;
            }
            let store = open_store(&settings)?;
            let rows = store.recent(limit)?;
            if rows.is_empty() {
                println!("No applications stored. Run 'run' first.");
            } else if json {
                for r in &rows {
                    println!("{}", serde_json::to_string(r)?);
                }
            } else {
                print_table(&rows);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_table(rows: &[db::ApplicationRecord]) {
    println!(
        "{:<14} | {:<32} | {:<10} | {:<10} | {:<30}",
        "Reference", "Address", "Scraped", "Closes", "Description"
    );
    println!("{}", "-".repeat(108));
    for r in rows {
        let closes = r
            .on_notice_to
            .map(parser::dates::canonical)
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<14} | {:<32} | {:<10} | {:<10} | {:<30}",
            truncate(&r.council_reference, 14),
            truncate(&r.address, 32),
            parser::dates::canonical(r.date_scraped),
            closes,
            truncate(&r.description, 30),
        );
    }
    println!("\n{} applications", rows.len());
}

fn open_store(settings: &Settings) -> anyhow::Result<RecordStore> {
    let store = RecordStore::open(&settings.db_path)?;
    store.ensure_schema()?;
    Ok(store)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
