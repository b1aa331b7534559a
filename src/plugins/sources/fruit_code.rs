use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::join_url;
use crate::config::MarketConfig;
use crate::models::FruitCode;
use crate::plugins::traits::CodeResolver;
use crate::utils::error::{AppError, LookupError};

/// First link inside the search results container.
static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.blog-posts a").expect("valid result link selector"));

const FRUIT_PATH_MARKER: &str = "/fruit/";

/// Resolves item codes through the site's full-text search page.
pub struct SearchPageResolver {
    client: Client,
    search_url: Url,
}

impl SearchPageResolver {
    pub fn new(client: Client, config: &MarketConfig) -> Result<Self, AppError> {
        let search_url = join_url(&config.base()?, &config.search_path)?;
        Ok(Self { client, search_url })
    }

    async fn fetch_results(&self, query: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[("q", query)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LookupError::transport("failed to fetch search results", e))?;

        response
            .text()
            .await
            .map_err(|e| LookupError::transport("failed to read search results", e))
    }
}

#[async_trait]
impl CodeResolver for SearchPageResolver {
    async fn resolve(&self, query: &str) -> Result<FruitCode, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::Resolution("empty fruit name".to_string()));
        }

        let html = self.fetch_results(query).await?;
        let code = parse_search_results(&html)?;
        tracing::debug!(query, code = %code.code, path = %code.detail_path, "Resolved fruit code");
        Ok(code)
    }
}

/// Pulls the item code out of the first result link, e.g. `/fruit/B5/香蕉` → `B5`.
pub fn parse_search_results(html: &str) -> Result<FruitCode, LookupError> {
    let document = Html::parse_document(html);

    let href = document
        .select(&RESULT_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .filter(|href| href.contains(FRUIT_PATH_MARKER))
        .ok_or_else(|| LookupError::Resolution("no matching link".to_string()))?;

    let code = href
        .split(FRUIT_PATH_MARKER)
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| LookupError::Resolution(format!("no item code in link '{}'", href)))?;

    Ok(FruitCode {
        code: code.to_string(),
        detail_path: href.to_string(),
    })
}
