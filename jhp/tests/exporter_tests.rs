//! Integration tests for the JHP exporter.
//!
//! These tests run the complete scrape flow against a mock upstream: fetch,
//! decode, publish and exposition through the HTTP router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mockito::{Mock, Server, ServerGuard};
use serde_json::json;
use shared::config::{ExporterConfig, ListenAddress, StaleSeriesPolicy};
use shared::server::create_router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const UPSTREAM_PATH: &str = "/jhucsse";

fn location(country: &str, city: &str, confirmed: &str, deaths: &str) -> serde_json::Value {
    json!({
        "country": country,
        "province": "",
        "city": city,
        "updatedAt": "2020-03-25 23:33:19",
        "stats": {"confirmed": confirmed, "deaths": deaths, "recovered": 0},
        "coordinates": {"latitude": "1.0", "longitude": "2.0"}
    })
}

async fn mock_upstream(server: &mut ServerGuard, body: &serde_json::Value) -> Mock {
    server
        .mock("GET", UPSTREAM_PATH)
        .match_header("user-agent", jhp::USER_AGENT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Creates a router whose upstream is the mock server.
fn test_app(server: &ServerGuard, policy: StaleSeriesPolicy) -> Router {
    let config = ExporterConfig::new(
        ListenAddress::new("127.0.0.1", 0),
        format!("{}{UPSTREAM_PATH}", server.url()),
        jhp::USER_AGENT,
    )
    .with_stale_series(policy);

    create_router(jhp::app_state(&config).unwrap())
}

async fn scrape(app: Router) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Finds the sample line of `family` whose labels include every `label="value"` pair.
fn sample<'a>(text: &'a str, family: &str, labels: &[(&str, &str)]) -> Option<&'a str> {
    text.lines().find(|line| {
        line.starts_with(&format!("{family}{{"))
            && labels
                .iter()
                .all(|(name, value)| line.contains(&format!("{name}=\"{value}\"")))
    })
}

fn sample_count(text: &str, family: &str) -> usize {
    text.lines()
        .filter(|line| line.starts_with(&format!("{family}{{")))
        .count()
}

#[tokio::test]
async fn test_scrape_publishes_sample_record() {
    let mut server = Server::new_async().await;
    let upstream = mock_upstream(&mut server, &json!([location("X", "", "10", "2")])).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (status, text) = scrape(app).await;
    assert_eq!(status, StatusCode::OK);
    upstream.assert_async().await;

    let labels = [
        ("country", "X"),
        ("province", ""),
        ("city", ""),
        ("latitude", "1.0"),
        ("longitude", "2.0"),
    ];
    let confirmed = sample(&text, "covid19JHP_confirmed_cases", &labels).unwrap();
    assert!(confirmed.ends_with(" 10"), "unexpected sample: {confirmed}");
    let deaths = sample(&text, "covid19JHP_deaths", &labels).unwrap();
    assert!(deaths.ends_with(" 2"), "unexpected sample: {deaths}");

    assert!(text.contains("# HELP covid19JHP_confirmed_cases John Hopkins data confirmed cases"));
    assert!(text.contains("# TYPE covid19JHP_deaths gauge"));
}

#[tokio::test]
async fn test_only_exporter_families_are_exposed() {
    let mut server = Server::new_async().await;
    let _upstream = mock_upstream(&mut server, &json!([location("X", "", "10", "2")])).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (_, text) = scrape(app).await;
    for line in text.lines().filter(|l| !l.starts_with('#')) {
        assert!(
            line.starts_with("covid19JHP_confirmed_cases{") || line.starts_with("covid19JHP_deaths{"),
            "unexpected series: {line}"
        );
    }
}

#[tokio::test]
async fn test_one_series_per_record_per_family() {
    let mut server = Server::new_async().await;
    let body = json!([
        location("X", "a", "10", "2"),
        location("X", "b", "4", "0"),
        location("Y", "", "7", "1"),
    ]);
    let _upstream = mock_upstream(&mut server, &body).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (status, text) = scrape(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sample_count(&text, "covid19JHP_confirmed_cases"), 3);
    assert_eq!(sample_count(&text, "covid19JHP_deaths"), 3);
}

#[tokio::test]
async fn test_repeated_scrape_is_idempotent() {
    let mut server = Server::new_async().await;
    let _upstream = mock_upstream(&mut server, &json!([location("X", "a", "10", "2")])).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (_, first) = scrape(app.clone()).await;
    let (_, second) = scrape(app).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_payload_retains_previous_series() {
    let mut server = Server::new_async().await;
    let first = mock_upstream(&mut server, &json!([location("X", "a", "10", "2")])).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);
    let (_, before) = scrape(app.clone()).await;
    first.remove_async().await;

    let _empty = mock_upstream(&mut server, &json!([])).await;
    let (status, after) = scrape(app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(before, after);
    assert!(sample(&after, "covid19JHP_confirmed_cases", &[("city", "a")]).is_some());
}

#[tokio::test]
async fn test_prune_policy_drops_vanished_locations() {
    let mut server = Server::new_async().await;
    let first = mock_upstream(
        &mut server,
        &json!([location("X", "a", "10", "2"), location("Y", "b", "1", "0")]),
    )
    .await;
    let app = test_app(&server, StaleSeriesPolicy::Prune);
    scrape(app.clone()).await;
    first.remove_async().await;

    let _second = mock_upstream(&mut server, &json!([location("X", "a", "12", "2")])).await;
    let (_, text) = scrape(app).await;

    assert_eq!(sample_count(&text, "covid19JHP_confirmed_cases"), 1);
    let confirmed = sample(&text, "covid19JHP_confirmed_cases", &[("country", "X")]).unwrap();
    assert!(confirmed.ends_with(" 12"));
}

#[tokio::test]
async fn test_non_numeric_count_skips_only_that_record() {
    let mut server = Server::new_async().await;
    let body = json!([location("X", "a", "n/a", "2"), location("Y", "b", "5", "1")]);
    let _upstream = mock_upstream(&mut server, &body).await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (status, text) = scrape(app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sample(&text, "covid19JHP_confirmed_cases", &[("country", "X")]).is_none());
    assert!(sample(&text, "covid19JHP_confirmed_cases", &[("country", "Y")]).is_some());
}

#[tokio::test]
async fn test_malformed_payload_fails_the_scrape() {
    let mut server = Server::new_async().await;
    let _upstream = server
        .mock("GET", UPSTREAM_PATH)
        .with_status(503)
        .with_body("<html>Service Unavailable</html>")
        .create_async()
        .await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let (status, text) = scrape(app).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(text.contains("decoded"));
}

/// Upstream that answers the first request with `body`, the second with a
/// response cut short of its declared `Content-Length` and the rest with `[]`.
async fn truncating_upstream(body: String) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&served);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }

            let response = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => complete_response(&body),
                1 => "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n[{\"country\"".to_string(),
                _ => complete_response("[]"),
            };
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}{UPSTREAM_PATH}"), served)
}

fn complete_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn test_truncated_body_fails_the_scrape_and_keeps_series() {
    let body = json!([location("X", "a", "10", "2")]).to_string();
    let (url, served) = truncating_upstream(body).await;
    let config = ExporterConfig::new(ListenAddress::new("127.0.0.1", 0), url, jhp::USER_AGENT);
    let app = create_router(jhp::app_state(&config).unwrap());

    let (status, before) = scrape(app.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sample(&before, "covid19JHP_confirmed_cases", &[("city", "a")]).is_some());

    let (status, reason) = scrape(app.clone()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(reason.contains("response body"), "unexpected reason: {reason}");

    // An empty payload publishes nothing, so this exposes what the failure left behind
    let (status, after) = scrape(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served.load(Ordering::SeqCst), 3);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_unreachable_upstream_fails_the_scrape() {
    let config = ExporterConfig::new(
        ListenAddress::new("127.0.0.1", 0),
        "http://127.0.0.1:1/jhucsse",
        jhp::USER_AGENT,
    );
    let app = create_router(jhp::app_state(&config).unwrap());

    let (status, _) = scrape(app).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_landing_page() {
    let server = Server::new_async().await;
    let app = test_app(&server, StaleSeriesPolicy::Retain);

    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("John Hopkins"));
    assert!(html.contains("href='/metrics'"));
}
