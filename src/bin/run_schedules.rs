// Manual one-shot trigger for the schedule execution engine.
// Usage: cargo run --bin run_schedules -- [--json]

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use netbank_api::config::Config;
use netbank_api::database;
use netbank_api::services::ScheduleEngine;
use netbank_api::store::{PgStore, Store};

#[derive(Parser)]
#[command(about = "Run one scan of due scheduled payments and exit")]
struct Args {
    /// Print the execution report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netbank_api=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db_pool = database::new_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&*db_pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));
    let engine = ScheduleEngine::new(store, &config.sender_name);

    let report = engine.run_once().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            claimed = report.claimed,
            completed = report.completed,
            rescheduled = report.rescheduled,
            skipped = report.skipped_insufficient,
            failed = report.failed,
            "scan finished"
        );
    }

    Ok(())
}
