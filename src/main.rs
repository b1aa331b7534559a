use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use veggie_watcher::core::{purchase_quantity, Household, PriceLookup};
use veggie_watcher::models::ProduceCategory;
use veggie_watcher::plugins::sources::recommend::render_table;
use veggie_watcher::plugins::sources::{http_client, RecommendationScraper};
use veggie_watcher::scheduler::{run_scheduled_check, WatchContext, WatchScheduler};
use veggie_watcher::utils::logging::init_tracing;
use veggie_watcher::web::{self, AppState};
use veggie_watcher::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "veggie-watcher",
    version,
    about = "Taiwanese produce prices: weekly picks, quantities and fruit alerts"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web UI and the weekly watch job (default).
    Serve,
    /// Run the watch job once: look up every favorite fruit and mail the cheap ones.
    Check,
    /// Look up current prices for the given fruits, e.g. `西瓜-大西瓜`.
    Lookup {
        #[arg(required = true)]
        fruits: Vec<String>,
    },
    /// Print this week's top vegetables and fruits.
    Recommend,
    /// How many vegetables to buy for a household.
    Convert {
        #[arg(long, default_value_t = 0)]
        children: u32,
        #[arg(long, default_value_t = 0)]
        women: u32,
        #[arg(long, default_value_t = 0)]
        men: u32,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Check => check(&config).await,
        Command::Lookup { fruits } => lookup(&config, &fruits).await,
        Command::Recommend => recommend(&config).await,
        Command::Convert { children, women, men, days } => {
            let quantity = purchase_quantity(&Household { children, women, men, days })?;
            println!(
                "🥬 蔬菜總共要買 {} 公斤（約 {} 台斤）🥬",
                quantity.kilograms, quantity.catties
            );
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("Starting Veggie Watcher...");

    let watch = Arc::new(WatchContext::from_config(&config)?);
    let recommender = Arc::new(RecommendationScraper::new(
        http_client(&config.market)?,
        &config.market,
    )?);
    let mut state = AppState::new(Arc::clone(&watch), recommender);

    let scheduler = if config.scheduler.enabled {
        let mut scheduler = WatchScheduler::new(Arc::clone(&watch), &config.scheduler).await?;
        scheduler.start().await?;
        let scheduler = Arc::new(Mutex::new(scheduler));
        state = state.with_scheduler(Arc::clone(&scheduler));
        Some(scheduler)
    } else {
        info!("Weekly watch job disabled");
        None
    };

    web::serve(&config, state).await?;

    if let Some(scheduler) = scheduler {
        scheduler.lock().await.shutdown().await?;
    }

    info!("Shutting down...");
    Ok(())
}

async fn check(config: &AppConfig) -> Result<()> {
    match run_scheduled_check(config).await {
        Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
        None => println!("Nothing checked, see {}", config.logging.file),
    }
    Ok(())
}

async fn lookup(config: &AppConfig, fruits: &[String]) -> Result<()> {
    let reports = PriceLookup::from_config(config)?.lookup_all(fruits).await;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

async fn recommend(config: &AppConfig) -> Result<()> {
    let scraper = RecommendationScraper::new(http_client(&config.market)?, &config.market)?;

    let categories = [
        ("🥬 蔬菜排行榜", ProduceCategory::Vegetable),
        ("🍎 水果排行榜", ProduceCategory::Fruit),
    ];

    for (title, category) in categories {
        println!("{}\n", title);
        match scraper.top_picks(category).await {
            Ok(picks) => println!("{}\n", render_table(&picks)),
            Err(e) => println!("載入失敗: {}\n", e),
        }
    }
    Ok(())
}
