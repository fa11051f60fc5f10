use std::sync::Arc;

use clap::{Parser, Subcommand};

use tagstream_crawler::{CallCounter, Crawler, RunStore};
use tagstream_publisher::{BusConfig, BusPublisher};

#[derive(Debug, Parser)]
#[command(name = "tagstream")]
#[command(about = "Hashtag crawl pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one crawl over the configured platforms and save the artifacts.
    Run {
        /// Comma-separated tags overriding the configured list.
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Per-tag result limit overriding the configured one.
        #[arg(long)]
        limit: Option<usize>,
        /// Also publish the results to the message bus.
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            tags,
            limit,
            publish,
        } => run_crawl(tags, limit, publish).await,
    }
}

async fn run_crawl(
    tags: Option<Vec<String>>,
    limit: Option<usize>,
    publish: bool,
) -> anyhow::Result<()> {
    let mut config = tagstream_core::load_app_config()?;
    if let Some(limit) = limit {
        config.limit = limit;
    }
    let config = Arc::new(config);

    tracing::info!(
        platforms = ?config.enabled_platforms,
        limit = config.limit,
        "starting crawl"
    );

    let counter = Arc::new(CallCounter::new());
    let crawler = Crawler::new(Arc::clone(&config), Arc::clone(&counter))?;
    let summary = crawler.run_once(tags).await?;

    for (name, outcome) in &summary.platforms {
        let mark = if outcome.success { "ok" } else { "failed" };
        println!("{name:<10} {mark:<7} {} records", outcome.record_count());
        for error in &outcome.errors {
            println!("           tag '{}': {}", error.tag, error.message);
        }
    }

    let stats = counter.snapshot();
    println!(
        "api calls: {} total, {} ok, {} failed",
        stats.total, stats.success, stats.failed
    );

    let store = RunStore::new(config.output_dir.clone());
    let path = store.save(&summary).await?;
    println!("saved {}", path.display());

    if publish {
        let publisher = BusPublisher::new(BusConfig::from_env());
        let report = publisher.publish_summary(&summary).await;
        if report.success {
            println!("published {} messages", report.sent);
        } else {
            tracing::warn!("message bus unavailable, publish skipped");
            println!("publish skipped: message bus unavailable");
        }
        publisher.disconnect().await;
    }

    Ok(())
}
