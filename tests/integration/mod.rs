// Shared fixtures: a mock market site, a static chart source and a recording mailbox.

pub mod api_tests;
pub mod lookup_tests;
pub mod watch_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use veggie_watcher::{
    config::{
        FavoritesConfig, LoggingConfig, MarketConfig, NotificationsConfig, SchedulerConfig,
        ScraperConfig, ServerConfig, SmtpConfig,
    },
    models::{FruitCode, YearAveragePrice},
    plugins::sources::{http_client, SearchPageResolver, WeeklyPriceApi},
    plugins::traits::{Dispatcher, Notification, NotificationResult, YearPriceSource},
    AppConfig, AppError, LookupError, PriceLookup,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Test configuration pointing the market site at `base_url`.
pub fn get_test_config(base_url: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8501,
        },
        market: MarketConfig {
            base_url: base_url.to_string(),
            search_path: "/search".to_string(),
            weekly_api_path: "/api/FarmTradeSumWeeks".to_string(),
            baseline_start_day: "2023/12/29".to_string(),
            request_timeout: 5,
            user_agent: "VeggieWatcher-Test/1.0".to_string(),
        },
        scraper: ScraperConfig {
            chrome_path: None,
            chart_wait_secs: 1,
            headless: true,
        },
        scheduler: SchedulerConfig {
            enabled: false,
            cron: "0 0 0 * * Mon".to_string(),
        },
        notifications: NotificationsConfig {
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                username: None,
                password: None,
                from_address: Some("dog@example.com".to_string()),
                from_name: "Veggie Watcher Test".to_string(),
            },
            subject: "🐶 果價汪汪".to_string(),
        },
        favorites: FavoritesConfig {
            path: PathBuf::from("fruit_list.json"),
        },
        logging: LoggingConfig {
            directory: PathBuf::from("."),
            file: "task_log.txt".to_string(),
            filter: "veggie_watcher=debug".to_string(),
        },
    }
}

pub fn search_page(href: Option<&str>) -> String {
    let results = match href {
        Some(href) => format!(r#"<a href="{}">result</a>"#, href),
        None => "<p>查無資料</p>".to_string(),
    };
    format!(
        r#"<html><body><a href="/fruit/ZZ/nav">nav</a>
           <div class="blog-posts">{}</div></body></html>"#,
        results
    )
}

/// Search page for `query` whose first result links to `/fruit/{code}/{query}`.
pub async fn mount_search(server: &MockServer, query: &str, code: Option<&str>) {
    let href = code.map(|code| format!("/fruit/{}/{}", code, query));
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(href.as_deref())))
        .mount(server)
        .await;
}

/// Matches weekly API calls whose JSON `filter` targets one item code.
pub struct FilterItemCode(pub &'static str);

impl Match for FilterItemCode {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .find(|(key, _)| key == "filter")
            .and_then(|(_, value)| serde_json::from_str::<serde_json::Value>(&value).ok())
            .is_some_and(|filter| filter["where"]["itemCode"] == self.0)
    }
}

pub fn weekly_mock(code: &'static str, body: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/api/FarmTradeSumWeeks"))
        .and(FilterItemCode(code))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

/// Year-average prices keyed by detail path, standing in for the rendered chart.
#[derive(Default)]
pub struct StaticYearPrices {
    prices: HashMap<String, f64>,
    calls: AtomicUsize,
}

impl StaticYearPrices {
    pub fn with(mut self, detail_path: &str, price: f64) -> Self {
        self.prices.insert(detail_path.to_string(), price);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl YearPriceSource for StaticYearPrices {
    async fn extract(&self, detail_path: &str) -> Result<YearAveragePrice, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .get(detail_path)
            .map(|&average_price| YearAveragePrice { average_price })
            .ok_or_else(|| LookupError::NotFound("year-average price label not found".to_string()))
    }
}

/// Keeps every notification instead of sending it; optionally fails instead.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
    fail_with: Option<String>,
}

impl RecordingDispatcher {
    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<NotificationResult, AppError> {
        if let Some(reason) = &self.fail_with {
            return Err(AppError::Email(reason.clone()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(NotificationResult {
            message_id: Some(format!("test-{}", self.sent.lock().unwrap().len())),
        })
    }
}

/// Real resolver and weekly client against the mock site, static chart prices.
pub fn build_lookup(config: &AppConfig, year: Arc<StaticYearPrices>) -> PriceLookup {
    let client = http_client(&config.market).unwrap();
    let resolver = SearchPageResolver::new(client.clone(), &config.market).unwrap();
    let weekly = WeeklyPriceApi::new(client, &config.market).unwrap();

    PriceLookup::new(Arc::new(resolver), Arc::new(weekly), year)
}

pub fn code(code: &str, name: &str) -> FruitCode {
    FruitCode {
        code: code.to_string(),
        detail_path: format!("/fruit/{}/{}", code, name),
    }
}
