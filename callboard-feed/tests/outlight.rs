use callboard_feed::{OutlightFeed, RankedToken, TokenSource};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn feed_with(server: &MockServer, response: ResponseTemplate) -> OutlightFeed {
    Mock::given(method("GET"))
        .and(path("/api/tokens/most-called"))
        .and(query_param("timeframe", "1h"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
    let url = format!("{}/api/tokens/most-called?timeframe=1h", server.uri());
    OutlightFeed::new(&url, false, Duration::from_secs(5)).expect("feed")
}

#[tokio::test]
async fn ranks_successful_response() {
    let server = MockServer::start().await;
    let feed = feed_with(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            { "symbol": "LOW", "address": "0x0", "channel_calls": [{ "win_rate": 25 }] },
            { "symbol": "FOO", "address": "0xA", "channel_calls": [{ "win_rate": 40 }, { "win_rate": 20 }] },
            { "symbol": "BAR", "address": "0xB", "channel_calls": [{ "win_rate": 50 }, { "win_rate": 70 }] }
        ])),
    )
    .await;

    let ranked = feed.top_tokens().await.expect("data");
    assert_eq!(
        ranked,
        vec![
            RankedToken::new("BAR", "0xB", 2),
            RankedToken::new("FOO", "0xA", 1)
        ]
    );
}

#[tokio::test]
async fn empty_response_is_no_data() {
    let server = MockServer::start().await;
    let feed = feed_with(&server, ResponseTemplate::new(200).set_body_json(json!([]))).await;
    assert!(feed.top_tokens().await.is_none());
}

#[tokio::test]
async fn nothing_above_threshold_is_no_data() {
    let server = MockServer::start().await;
    let feed = feed_with(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            { "symbol": "LOW", "address": "0x0", "channel_calls": [{ "win_rate": 30 }] }
        ])),
    )
    .await;
    assert!(feed.top_tokens().await.is_none());
}

#[tokio::test]
async fn server_error_is_no_data_without_retry() {
    let server = MockServer::start().await;
    let feed = feed_with(&server, ResponseTemplate::new(503)).await;
    assert!(feed.top_tokens().await.is_none());
}

#[tokio::test]
async fn malformed_body_is_no_data() {
    let server = MockServer::start().await;
    let feed = feed_with(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "tokens": "not-a-list" })),
    )
    .await;
    assert!(feed.top_tokens().await.is_none());
}
