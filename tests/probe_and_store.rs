use std::time::Duration;

use availability_probe::timestamp;
use availability_probe::{
    Aggregate, AttemptStore, Availability, InitOutcome, Prober, ReqwestClient, StoreLocation,
};
use tempfile::TempDir;
use tracing::Span;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_in(dir: &TempDir) -> AttemptStore {
    let location = StoreLocation::new(dir.path().join(".db"), "requests.db");
    let mut store = AttemptStore::new(location, Span::none());
    assert_eq!(store.initialize(), InitOutcome::Created);
    store.connect();
    store
}

#[tokio::test]
async fn probe_cycle_is_recorded_and_aggregated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "id=42"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let prober = Prober::new(ReqwestClient::new().unwrap(), Span::none());

    let record = prober.probe(&server.uri(), 3, Duration::ZERO).await;
    store.append(&record);

    assert_eq!(record.successful_attempts, 2);
    assert_eq!(record.status_code, Some(200));
    assert_eq!(record.cookies["id"], "42");

    let totals = store.aggregate(&server.uri());
    assert_eq!(totals, Aggregate { successful: 2, requested: 3 });

    let at = timestamp::to_canonical(&record.timestamp);
    assert_eq!(store.aggregate_in_range(&server.uri(), &at, &at), totals);
    assert_eq!(
        store.aggregate_in_range(&server.uri(), "2000-01-01T00:00:00", "2000-12-31T23:59:59"),
        Aggregate::default()
    );

    match Availability::from_aggregate(totals, false) {
        Availability::Percentage(pct) => assert!((pct - 200.0 / 3.0).abs() < 1e-9),
        other => panic!("unexpected availability: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_site_is_recorded_without_response_data() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let prober = Prober::new(ReqwestClient::new().unwrap(), Span::none());

    let record = prober.probe(&url, 2, Duration::ZERO).await;
    store.append(&record);

    assert_eq!(record.status_code, None);
    assert_eq!(record.elapsed_seconds, None);
    assert!(record.headers.is_empty());
    assert_eq!(store.aggregate(&url), Aggregate { successful: 0, requested: 2 });
    assert_eq!(
        Availability::from_aggregate(store.aggregate(&url), false),
        Availability::NoSuccessfulAttempts
    );
}
