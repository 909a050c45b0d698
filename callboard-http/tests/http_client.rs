use callboard_http::{Auth, HttpClient, HttpError, MultipartFile, RequestOpts, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpClient {
    HttpClient::new(&server.uri())
        .expect("client")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn retries_server_errors_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let body: Value = client(&server)
        .with_retries(1)
        .get_json("/flaky", RequestOpts::default())
        .await
        .expect("second attempt succeeds");
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn zero_retries_surfaces_rate_limit_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-reset", "1700000000")
                .set_body_json(json!({ "title": "Too Many Requests", "detail": "Too Many Requests" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .with_retries(0)
        .post_json::<_, Value>("/2/tweets", None, &json!({ "text": "hi" }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    match err {
        HttpError::Api {
            rate_limit_reset, ..
        } => assert_eq!(rate_limit_reset, Some(1_700_000_000)),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn bearer_and_absolute_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1" })))
        .expect(1)
        .mount(&server)
        .await;

    let other_base = HttpClient::new("https://unused.invalid/").unwrap();
    let absolute = format!("{}/v1/chat/completions", server.uri());
    let body: Value = other_base
        .post_json_opts(
            &absolute,
            &json!({}),
            RequestOpts {
                auth: Some(Auth::Bearer("sk-test")),
                allow_absolute: true,
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
        .expect("absolute url used as-is");
    assert_eq!(body["id"], "c1");
}

#[tokio::test]
async fn multipart_upload_sends_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "77" })))
        .expect(1)
        .mount(&server)
        .await;

    let body: Value = client(&server)
        .post_multipart(
            "/upload",
            MultipartFile {
                field: "media".into(),
                file_name: "msgtwt.png".into(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
            RequestOpts::default(),
        )
        .await
        .expect("upload");
    assert_eq!(body["media_id_string"], "77");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
    let raw = String::from_utf8_lossy(&requests[0].body);
    assert!(raw.contains("name=\"media\""));
    assert!(raw.contains("filename=\"msgtwt.png\""));
}

#[tokio::test]
async fn undecodable_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_json::<Value>("/html", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet.contains("maintenance")));
}
