// Scheduled watch runs, end to end

use super::*;
use serde_json::json;
use tempfile::TempDir;
use veggie_watcher::scheduler::{run_watch_task, LogStatus, WatchContext, WatchScheduler};
use veggie_watcher::{FavoriteList, FavoritesStore, NotifyOutcome};

struct Fixture {
    _server: MockServer,
    _dir: TempDir,
    dispatcher: Arc<RecordingDispatcher>,
    context: Arc<WatchContext>,
}

/// x resolves and is cheaper than its yearly average, y has no search result.
async fn fixture(dispatcher: RecordingDispatcher) -> Fixture {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    mount_search(&server, "y", None).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 12.0}]))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let year = Arc::new(StaticYearPrices::default().with("/fruit/X1/x", 15.0));
    let dir = TempDir::new().unwrap();
    let dispatcher = Arc::new(dispatcher);

    let context = Arc::new(WatchContext {
        store: FavoritesStore::new(dir.path().join("fruit_list.json")),
        lookup: build_lookup(&config, year),
        dispatcher: Arc::clone(&dispatcher) as Arc<dyn Dispatcher>,
        subject: config.notifications.subject.clone(),
    });

    Fixture {
        _server: server,
        _dir: dir,
        dispatcher,
        context,
    }
}

#[tokio::test]
async fn test_weekly_run_mails_cheap_fruit_only() {
    let fixture = fixture(RecordingDispatcher::default()).await;
    fixture
        .context
        .store
        .save(&FavoriteList::from_input("x, y", "a@b.com"))
        .await
        .unwrap();

    let summary = run_watch_task(&fixture.context).await.unwrap().expect("favorites are saved");

    assert_eq!(summary.recipient, "a@b.com");
    assert_eq!(summary.cheap.len(), 1);
    assert_eq!(summary.cheap[0].fruit(), "x");

    let successes = summary.log.iter().filter(|l| l.status == LogStatus::Success).count();
    let failures = summary.log.iter().filter(|l| l.status == LogStatus::Failure).count();
    assert_eq!((successes, failures), (1, 1));

    let sent = fixture.dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@b.com");
    assert_eq!(sent[0].subject, "🐶 果價汪汪");
    assert!(sent[0].body.contains("x"));
    assert!(!sent[0].body.contains("y"));
    assert!(matches!(summary.notification, NotifyOutcome::Sent { .. }));
}

#[tokio::test]
async fn test_no_cheap_fruit_sends_nothing() {
    let fixture = fixture(RecordingDispatcher::default()).await;
    fixture
        .context
        .store
        .save(&FavoriteList::from_input("y", "a@b.com"))
        .await
        .unwrap();

    let summary = run_watch_task(&fixture.context).await.unwrap().unwrap();

    assert!(summary.cheap.is_empty());
    assert_eq!(summary.notification, NotifyOutcome::NothingToNotify);
    assert!(fixture.dispatcher.sent().is_empty());
}

#[tokio::test]
async fn test_missing_favorites_file_skips_run() {
    let fixture = fixture(RecordingDispatcher::default()).await;

    assert!(run_watch_task(&fixture.context).await.unwrap().is_none());
    assert!(fixture.dispatcher.sent().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_records_failed_dispatch() {
    let fixture = fixture(RecordingDispatcher::failing("535 authentication failed")).await;
    fixture
        .context
        .store
        .save(&FavoriteList::from_input("x", "a@b.com"))
        .await
        .unwrap();

    let config = get_test_config("http://unused");
    let scheduler = WatchScheduler::new(Arc::clone(&fixture.context), &config.scheduler)
        .await
        .unwrap();

    let summary = scheduler.run_now().await.unwrap().unwrap();
    assert!(summary.notification.is_failed());

    let stats = scheduler.stats().await;
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.failures, 1);
    assert!(stats.last_error.unwrap().contains("535"));
}
