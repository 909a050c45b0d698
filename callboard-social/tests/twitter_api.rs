use callboard_common::TwitterCredentials;
use callboard_social::twitter::{SocialError, TwitterApi};
use callboard_social::{PostDraft, Publisher};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> TwitterCredentials {
    TwitterCredentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
    }
}

fn api_for(server: &MockServer) -> TwitterApi {
    let base = format!("{}/", server.uri());
    let upload = format!("{}/1.1/media/upload.json", server.uri());
    TwitterApi::with_endpoints(credentials(), &base, &upload).expect("client")
}

#[tokio::test]
async fn verify_credentials_reads_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "99", "name": "Calls", "username": "callboard" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = api_for(&server).verify_credentials().await.expect("me");
    assert_eq!(account.username, "callboard");
    assert_eq!(account.id, "99");
}

#[tokio::test]
async fn rejected_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized", "detail": "Unauthorized", "status": 401
        })))
        .mount(&server)
        .await;

    let err = api_for(&server).verify_credentials().await.unwrap_err();
    assert!(matches!(err, SocialError::Unauthorized { status: 401, .. }));
}

#[tokio::test]
async fn publish_reply_with_media() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_exists("authorization"))
        .and(body_json(json!({
            "text": "4. $FOO",
            "reply": { "in_reply_to_tweet_id": "100" },
            "media": { "media_ids": ["555"] }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "101", "text": "4. $FOO" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = PostDraft::new("4. $FOO")
        .in_reply_to("100")
        .with_media(Some("555".into()));
    let id = api_for(&server).publish(&draft).await.expect("publish");
    assert_eq!(id, "101");
}

#[tokio::test]
async fn rate_limit_is_not_retried_and_keeps_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-reset", "1700000000")
                .set_body_json(json!({ "title": "Too Many Requests" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = api_for(&server)
        .publish(&PostDraft::new("gm"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SocialError::RateLimited {
            reset: Some(1_700_000_000)
        }
    ));
}

#[tokio::test]
async fn upload_media_posts_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media_id": 710511363345354753u64,
            "media_id_string": "710511363345354753",
            "size": 11065
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG fake").unwrap();

    let id = api_for(&server)
        .upload_media(file.path())
        .await
        .expect("upload");
    assert_eq!(id, "710511363345354753");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn missing_media_file_fails_before_any_request() {
    let server = MockServer::start().await;
    let err = api_for(&server)
        .upload_media(std::path::Path::new("does/not/exist.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::Media { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
