//! Integration tests for the fetcher's retry and failure handling

use deep_harvest::config::FetchSettings;
use deep_harvest::Fetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> FetchSettings {
    FetchSettings {
        timeout_secs: 5,
        backoff_base_ms: 1,
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body>ready</body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fast_settings());
    let result = fetcher
        .fetch(&format!("{}/flaky", server.uri()), 3)
        .await
        .expect("third attempt should succeed");

    assert_eq!(result.status, 200);
    assert_eq!(result.content_type().as_deref(), Some("text/html"));
    assert_eq!(result.text_or_empty(), "<html><body>ready</body></html>");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    fetcher.close().await;
}

#[tokio::test]
async fn test_exhausted_attempts_return_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fast_settings());
    let result = fetcher.fetch(&format!("{}/gone", server.uri()), 3).await;

    assert!(result.is_none());
}

#[tokio::test]
async fn test_unreachable_host_returns_none() {
    let fetcher = Fetcher::new(FetchSettings {
        timeout_secs: 1,
        ..fast_settings()
    });

    // Port 9 (discard) on localhost is expected to refuse connections
    let result = fetcher.fetch("http://127.0.0.1:9/", 2).await;
    assert!(result.is_none());
}

#[tokio::test]
async fn test_redirect_sets_final_url() {
    let server = MockServer::start().await;
    let new_url = format!("{}/new", server.uri());

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", new_url.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(fast_settings());
    let result = fetcher
        .fetch(&format!("{}/old", server.uri()), 1)
        .await
        .unwrap();

    assert_eq!(result.final_url, new_url);
    assert_eq!(result.body, b"moved here".to_vec());
}
