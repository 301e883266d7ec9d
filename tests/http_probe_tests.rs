use std::sync::Arc;
use std::time::Duration;

use pathscout::probe::{HttpProber, ProbeConfig, ProbeStatus, Prober};
use pathscout::scanner::{ScanConfig, ScanController};
use pathscout::types::{Outcome, ScanState};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prober() -> HttpProber {
    HttpProber::new(&ProbeConfig {
        timeout: Duration::from_secs(5),
        ..ProbeConfig::default()
    })
    .expect("client builds")
}

#[tokio::test]
async fn reads_real_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let p = prober();
    let cancel = CancellationToken::new();
    let found = p.probe(&format!("{}/admin", server.uri()), &cancel).await;
    let missing = p.probe(&format!("{}/nope", server.uri()), &cancel).await;

    assert_eq!(found, ProbeStatus::Status(200));
    assert_eq!(missing, ProbeStatus::Status(404));
}

#[tokio::test]
async fn redirects_are_reported_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;

    let status = prober()
        .probe(&format!("{}/old", server.uri()), &CancellationToken::new())
        .await;
    assert_eq!(status, ProbeStatus::Status(301));
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    let status = prober()
        .probe("http://127.0.0.1:1/admin", &CancellationToken::new())
        .await;
    assert!(matches!(status, ProbeStatus::Error(_)));
}

#[tokio::test]
async fn cancellation_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let status = tokio::time::timeout(
        Duration::from_secs(2),
        prober().probe(&format!("{}/slow", server.uri()), &cancel),
    )
    .await
    .expect("probe ignored cancellation");
    assert_eq!(status, ProbeStatus::Aborted);
}

#[tokio::test]
async fn controller_scans_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("SECRET=1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(&server)
        .await;

    let ctl = ScanController::new(
        Arc::new(prober()),
        ScanConfig {
            delay: Duration::from_millis(5),
            ..ScanConfig::default()
        },
    );
    let target = format!("{}/", server.uri());
    ctl.start(&target, vec![".env".into(), "admin".into(), "missing".into()])
        .await
        .unwrap();
    assert_eq!(ctl.wait().await, ScanState::Completed);

    let results = ctl.results().await;
    let summary: Vec<_> = results
        .iter()
        .map(|r| (r.path.as_str(), r.outcome, r.status.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (".env", Outcome::Found, "200"),
            ("admin", Outcome::Found, "302"),
            ("missing", Outcome::NotFound, "404"),
        ]
    );
    assert_eq!(results[0].url, format!("{}/.env", server.uri()));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
