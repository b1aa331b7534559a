// Price lookups against a mock market site

use super::*;
use serde_json::json;
use veggie_watcher::plugins::traits::{CodeResolver, WeeklyPriceSource};
use veggie_watcher::utils::error::FailureKind;

#[tokio::test]
async fn test_cheap_fruit_lookup() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    weekly_mock(
        "X1",
        json!([
            {"endDay": "2025/06/08", "avgPrice": 18.3},
            {"endDay": "2025/06/15", "avgPrice": 12.0}
        ]),
    )
    .expect(1)
    .mount(&server)
    .await;

    let config = get_test_config(&server.uri());
    let year = Arc::new(StaticYearPrices::default().with("/fruit/X1/x", 15.0));
    let lookup = build_lookup(&config, Arc::clone(&year));

    let report = lookup.lookup("x").await;

    let snapshot = report.as_success().expect("lookup should succeed");
    assert_eq!(snapshot.weekly().period, "2025/06/15");
    assert_eq!(snapshot.weekly().average_price, 12.0);
    assert_eq!(snapshot.year().average_price, 15.0);
    assert!(snapshot.is_currently_cheap());
    assert_eq!(year.calls(), 1);
}

#[tokio::test]
async fn test_unresolved_fruit_stops_before_prices() {
    let server = MockServer::start().await;
    mount_search(&server, "y", None).await;
    Mock::given(path("/api/FarmTradeSumWeeks"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let year = Arc::new(StaticYearPrices::default());
    let report = build_lookup(&config, Arc::clone(&year)).lookup("y").await;

    let failure = report.as_failure().expect("lookup should fail");
    assert_eq!(failure.kind, FailureKind::Resolution);
    assert_eq!(failure.message, "no matching link");
    assert_eq!(year.calls(), 0);
}

#[tokio::test]
async fn test_search_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let report = build_lookup(&config, Arc::new(StaticYearPrices::default()))
        .lookup("x")
        .await;

    let failure = report.as_failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(failure.trace.as_ref().is_some_and(|trace| !trace.is_empty()));
}

#[tokio::test]
async fn test_empty_weekly_list_is_data_failure() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    weekly_mock("X1", json!([])).mount(&server).await;

    let config = get_test_config(&server.uri());
    let year = Arc::new(StaticYearPrices::default().with("/fruit/X1/x", 15.0));
    let report = build_lookup(&config, Arc::clone(&year)).lookup("x").await;

    let failure = report.as_failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Data);
    assert_eq!(failure.message, "empty or malformed response");
    assert_eq!(year.calls(), 0);
}

#[tokio::test]
async fn test_zero_weekly_price_is_data_failure() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 0}]))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let report = build_lookup(&config, Arc::new(StaticYearPrices::default()))
        .lookup("x")
        .await;

    let failure = report.as_failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Data);
    assert_eq!(failure.message, "missing price or period field");
}

#[tokio::test]
async fn test_missing_chart_label_is_not_found() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 12.0}]))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let report = build_lookup(&config, Arc::new(StaticYearPrices::default()))
        .lookup("x")
        .await;

    assert_eq!(report.as_failure().unwrap().kind, FailureKind::NotFound);
}

#[tokio::test]
async fn test_resolver_sends_query_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "西瓜-大西瓜"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(Some("/fruit/T1/西瓜-大西瓜"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let client = http_client(&config.market).unwrap();
    let resolver = SearchPageResolver::new(client, &config.market).unwrap();

    let resolved = resolver.resolve(" 西瓜-大西瓜 ").await.unwrap();
    assert_eq!(resolved, code("T1", "西瓜-大西瓜"));
}

#[tokio::test]
async fn test_weekly_client_sends_filter() {
    let server = MockServer::start().await;
    weekly_mock("T1", json!([{"endDay": "2025/06/15", "avgPrice": 28.4}]))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let weekly = WeeklyPriceApi::new(http_client(&config.market).unwrap(), &config.market).unwrap();

    let price = weekly.fetch(&code("T1", "西瓜-大西瓜")).await.unwrap();
    assert_eq!(price.average_price, 28.4);
}

#[tokio::test]
async fn test_lookup_all_keeps_order() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    mount_search(&server, "y", None).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 16.0}]))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let year = Arc::new(StaticYearPrices::default().with("/fruit/X1/x", 15.0));
    let lookup = build_lookup(&config, year);

    let fruits = vec!["y".to_string(), "x".to_string(), "y".to_string()];
    let reports = lookup.lookup_all(&fruits).await;

    let names: Vec<&str> = reports.iter().map(|r| r.fruit()).collect();
    assert_eq!(names, vec!["y", "x", "y"]);
    assert!(reports[1].is_success());
    assert!(!reports[1].is_currently_cheap());
}
