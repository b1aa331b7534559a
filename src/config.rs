use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub favorites: FavoritesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Endpoints and constants of the market data site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub base_url: String,
    pub search_path: String,
    pub weekly_api_path: String,
    /// Lower bound for `startDay` in the weekly price query, `YYYY/MM/DD`.
    pub baseline_start_day: String,
    pub request_timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub chrome_path: Option<String>,
    /// Upper bound, in seconds, for the chart labels to show up.
    pub chart_wait_secs: u64,
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (sec min hour day month weekday), evaluated in UTC.
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub smtp: SmtpConfig,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file: String,
    pub filter: String,
}

impl MarketConfig {
    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Message(format!("Invalid market base URL: {}", e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl ScraperConfig {
    pub fn chart_wait(&self) -> Duration {
        Duration::from_secs(self.chart_wait_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, ignored by git
            .add_source(File::with_name("config/local").required(false))
            // e.g. VEGGIE__NOTIFICATIONS__SMTP__PASSWORD
            .add_source(Environment::with_prefix("VEGGIE").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8501)?
            .set_default("market.base_url", "https://www.twfood.cc")?
            .set_default("market.search_path", "/search")?
            .set_default("market.weekly_api_path", "/api/FarmTradeSumWeeks")?
            .set_default("market.baseline_start_day", "2023/12/29")?
            .set_default("market.request_timeout", 10)?
            .set_default(
                "market.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36",
            )?
            .set_default("scraper.chart_wait_secs", 10)?
            .set_default("scraper.headless", true)?
            .set_default("scheduler.enabled", true)?
            // Monday 08:00 in Taipei
            .set_default("scheduler.cron", "0 0 0 * * Mon")?
            .set_default("notifications.subject", "🐶 果價汪汪")?
            .set_default("notifications.smtp.host", "smtp.gmail.com")?
            .set_default("notifications.smtp.port", 587)?
            .set_default("notifications.smtp.from_name", "Veggie Watcher")?
            .set_default("favorites.path", "fruit_list.json")?
            .set_default("logging.directory", ".")?
            .set_default("logging.file", "task_log.txt")?
            .set_default("logging.filter", "veggie_watcher=info,tower_http=info")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        self.market.base()?;

        for path in [&self.market.search_path, &self.market.weekly_api_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::Message(format!(
                    "Market path '{}' must start with '/'",
                    path
                )));
            }
        }

        if chrono::NaiveDate::parse_from_str(&self.market.baseline_start_day, "%Y/%m/%d").is_err() {
            return Err(ConfigError::Message(
                "Market baseline_start_day must be formatted YYYY/MM/DD".into(),
            ));
        }

        if self.market.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Market request_timeout must be greater than 0".into(),
            ));
        }

        if self.scraper.chart_wait_secs == 0 {
            return Err(ConfigError::Message(
                "Scraper chart_wait_secs must be greater than 0".into(),
            ));
        }

        if !is_valid_cron(&self.scheduler.cron) {
            return Err(ConfigError::Message("Invalid cron expression in scheduler.cron".into()));
        }

        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if self.logging.file.trim().is_empty() {
            return Err(ConfigError::Message("Logging file name must not be empty".into()));
        }

        Ok(())
    }
}

/// Shallow check of a six or seven field cron expression; the scheduler does the real parse.
pub fn is_valid_cron(cron_expr: &str) -> bool {
    let parts: Vec<&str> = cron_expr.split_whitespace().collect();
    if !(6..=7).contains(&parts.len()) {
        return false;
    }

    parts.iter().all(|part| {
        part.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | ',' | '/' | '?'))
    })
}
