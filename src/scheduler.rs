use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::config::{AppConfig, SchedulerConfig};
use crate::core::{notify, NotifyOutcome, PriceLookup};
use crate::favorites::FavoritesStore;
use crate::models::{FavoriteList, FruitPriceReport};
use crate::plugins::notifiers::EmailNotifier;
use crate::plugins::traits::Dispatcher;
use crate::utils::error::AppError;

/// Everything one watch run needs.
pub struct WatchContext {
    pub store: FavoritesStore,
    pub lookup: PriceLookup,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub subject: String,
}

impl WatchContext {
    /// Favorites file, live price sources and the SMTP mailer from config.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            store: FavoritesStore::new(config.favorites.path.clone()),
            lookup: PriceLookup::from_config(config)?,
            dispatcher: Arc::new(EmailNotifier::new(&config.notifications.smtp)?),
            subject: config.notifications.subject.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Failure,
}

/// One line of the batch log, one per fruit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchLogLine {
    pub fruit: String,
    pub status: LogStatus,
    pub detail: String,
}

impl BatchLogLine {
    pub fn from_report(report: &FruitPriceReport) -> Self {
        match report {
            FruitPriceReport::Success(snapshot) => Self {
                fruit: snapshot.fruit().to_string(),
                status: LogStatus::Success,
                detail: format!(
                    "period {}, weekly {}, year {}, cheap: {}",
                    snapshot.weekly().period,
                    snapshot.weekly().average_price,
                    snapshot.year().average_price,
                    snapshot.is_currently_cheap()
                ),
            },
            FruitPriceReport::Failure(failure) => Self {
                fruit: failure.fruit.clone(),
                status: LogStatus::Failure,
                detail: format!("{:?}: {}", failure.kind, failure.message),
            },
        }
    }
}

impl fmt::Display for BatchLogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?} ({})", self.fruit, self.status, self.detail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchRunSummary {
    pub recipient: String,
    pub reports: Vec<FruitPriceReport>,
    pub cheap: Vec<FruitPriceReport>,
    pub log: Vec<BatchLogLine>,
    pub notification: NotifyOutcome,
}

/// The scheduled entry point: read favorites, look every fruit up, mail the cheap ones.
///
/// Returns `Ok(None)` when no favorites have been saved yet.
pub async fn run_watch_task(context: &WatchContext) -> Result<Option<WatchRunSummary>, AppError> {
    let Some(favorites) = context.store.load().await? else {
        tracing::warn!(
            path = %context.store.path().display(),
            "No favorites saved, skipping watch run"
        );
        return Ok(None);
    };

    Ok(Some(watch_favorites(context, &favorites).await))
}

/// One-shot run for the command line: builds the context and runs the task.
///
/// Errors are logged and swallowed. `None` covers both a skipped and a failed run.
pub async fn run_scheduled_check(config: &AppConfig) -> Option<WatchRunSummary> {
    let result = match WatchContext::from_config(config) {
        Ok(context) => run_watch_task(&context).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %e, "Scheduled check failed");
            None
        }
    }
}

/// Runs the lookups and notification for an already loaded list.
///
/// A failed dispatch ends up in `notification` instead of failing the run.
pub async fn watch_favorites(context: &WatchContext, favorites: &FavoriteList) -> WatchRunSummary {
    tracing::info!(email = %favorites.email, fruits = ?favorites.fruits, "Starting watch run");

    let reports = context.lookup.lookup_all(&favorites.fruits).await;

    let log: Vec<BatchLogLine> = reports.iter().map(BatchLogLine::from_report).collect();
    for line in &log {
        match line.status {
            LogStatus::Success => tracing::info!("{}", line),
            LogStatus::Failure => tracing::warn!("{}", line),
        }
    }

    let dispatcher = context.dispatcher.as_ref();
    let (cheap, notification) =
        match notify(dispatcher, &favorites.email, &context.subject, &reports).await {
            Ok(outcome) => outcome,
            Err(e) => (
                crate::core::decide(&reports),
                NotifyOutcome::Failed {
                    recipient: favorites.email.clone(),
                    error: e.to_string(),
                },
            ),
        };

    WatchRunSummary {
        recipient: favorites.email.clone(),
        reports,
        cheap,
        log,
        notification,
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct WatchStats {
    pub runs: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Cron-driven wrapper around [`run_watch_task`].
pub struct WatchScheduler {
    scheduler: JobScheduler,
    context: Arc<WatchContext>,
    stats: Arc<RwLock<WatchStats>>,
    cron: String,
    job_id: Option<Uuid>,
}

impl WatchScheduler {
    pub async fn new(context: Arc<WatchContext>, config: &SchedulerConfig) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            context,
            stats: Arc::new(RwLock::new(WatchStats::default())),
            cron: config.cron.clone(),
            job_id: None,
        })
    }

    /// Registers the weekly job and starts ticking. Cron times are UTC.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let context = Arc::clone(&self.context);
        let stats = Arc::clone(&self.stats);

        let job = Job::new_async(self.cron.as_str(), move |_uuid, _l| {
            let context = Arc::clone(&context);
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                // Errors are recorded and logged; the next tick runs regardless.
                let _ = Self::execute(&context, &stats).await;
            })
        })?;

        let job_id = self.scheduler.add(job).await?;
        self.job_id = Some(job_id);
        self.scheduler.start().await?;

        tracing::info!(cron = %self.cron, job = %job_id, "Watch scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Watch scheduler shutdown");
        Ok(())
    }

    /// Runs the watch task immediately, outside of the schedule.
    pub async fn run_now(&self) -> Result<Option<WatchRunSummary>, AppError> {
        Self::execute(&self.context, &self.stats).await
    }

    pub async fn stats(&self) -> WatchStats {
        self.stats.read().await.clone()
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    async fn execute(
        context: &WatchContext,
        stats: &RwLock<WatchStats>,
    ) -> Result<Option<WatchRunSummary>, AppError> {
        let result = run_watch_task(context).await;

        let error = match &result {
            Ok(Some(summary)) => match &summary.notification {
                NotifyOutcome::Failed { error, .. } => Some(error.clone()),
                _ => None,
            },
            Ok(None) => None,
            Err(e) => Some(e.to_string()),
        };

        match &error {
            Some(e) => tracing::error!("Watch run failed: {}", e),
            None => tracing::info!("Watch run completed"),
        }

        let mut stats = stats.write().await;
        stats.runs += 1;
        stats.last_run = Some(Utc::now());
        match error {
            Some(e) => {
                stats.failures += 1;
                stats.last_error = Some(e);
            }
            None => {
                stats.successes += 1;
                stats.last_error = None;
            }
        }

        result
    }
}
