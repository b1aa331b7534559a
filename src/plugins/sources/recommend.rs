use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::join_url;
use crate::config::MarketConfig;
use crate::models::{ProduceCategory, Recommendation};
use crate::utils::error::AppError;

static ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.vege_price").expect("valid item selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid title selector"));
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.text-price").expect("valid price selector"));

const RANK_MARKER: &str = "推薦No:";
const WHOLESALE_INDEX: usize = 1;
const RETAIL_INDEX: usize = 3;

/// Scrapes the weekly top-5 vegetable and fruit picks.
pub struct RecommendationScraper {
    client: Client,
    base: Url,
}

impl RecommendationScraper {
    pub fn new(client: Client, config: &MarketConfig) -> Result<Self, AppError> {
        Ok(Self {
            client,
            base: config.base()?,
        })
    }

    pub async fn top_picks(
        &self,
        category: ProduceCategory,
    ) -> Result<Vec<Recommendation>, AppError> {
        let url = join_url(&self.base, category.path())?;

        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let picks = parse_top_picks(&html);
        tracing::info!(?category, count = picks.len(), "Scraped weekly picks");
        Ok(picks)
    }
}

/// Parses every `div.vege_price` card; cards missing a name or a price are skipped.
pub fn parse_top_picks(html: &str) -> Vec<Recommendation> {
    let document = Html::parse_document(html);

    document
        .select(&ITEM)
        .filter_map(|item| {
            let parsed = parse_item(item);
            if parsed.is_none() {
                let text = item.text().collect::<String>();
                tracing::warn!("Skipping malformed pick: {}", text.trim());
            }
            parsed
        })
        .collect()
}

fn parse_item(item: ElementRef<'_>) -> Option<Recommendation> {
    // " 推薦No: 1 菜豆-青色 " -> "菜豆-青色"
    let title = item.select(&TITLE).next()?.text().collect::<String>();
    let name = title
        .split(RANK_MARKER)
        .nth(1)?
        .split_whitespace()
        .nth(1)?
        .to_string();

    let prices: Vec<String> = item
        .select(&PRICE)
        .map(|span| span.text().collect::<String>().trim().to_string())
        .collect();

    let wholesale_price = prices.get(WHOLESALE_INDEX)?.parse().ok()?;
    let retail_price = prices.get(RETAIL_INDEX)?.parse().ok()?;

    Some(Recommendation {
        name,
        wholesale_price,
        retail_price,
    })
}

/// Pipe table with centred columns, one decimal per price.
pub fn render_table(picks: &[Recommendation]) -> String {
    let mut lines = vec![
        "| Name | Wholesale | Retail | Fair range |".to_string(),
        "|:---:|:---:|:---:|:---:|".to_string(),
    ];

    lines.extend(picks.iter().map(|pick| {
        format!(
            "| {} | {:.1} | {:.1} | {} |",
            pick.name,
            pick.wholesale_price,
            pick.retail_price,
            pick.reasonable_range_label()
        )
    }));

    lines.join("\n")
}
