mod common;

use feedline_http::{HttpError, StatusCode};
use feedline_social::{InstagramCredentials, InstagramProvider, Provider, ProviderError, Source};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "/oauth/access_token";
const MEDIA: &str = "/v1/users/self/media/recent/";
const TOKEN_BODY: &str =
    r#"{"access_token":"fb2e77d.47a0479900504cb3ab4a1f626d174d2d","user":{"id":"1574083","username":"snoopdogg"}}"#;

fn credentials() -> InstagramCredentials {
    InstagramCredentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        redirect_uri: "https://example.com/callback".into(),
    }
}

fn provider_for(server: &MockServer) -> InstagramProvider {
    common::init_test_tracing();
    InstagramProvider::with_base_url(credentials(), &server.uri()).unwrap()
}

async fn mount_token_exchange(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Fexample.com%2Fcallback",
        ))
        .and(body_string_contains("code=the-code"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_BODY))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn first_initialize_returns_raw_body() {
    let server = MockServer::start().await;
    mount_token_exchange(&server, 1).await;

    let provider = provider_for(&server);
    let body = provider.initialize("the-code").await.unwrap();

    assert_eq!(body, TOKEN_BODY);
    assert_eq!(
        provider.access_token().await.as_deref(),
        Some("fb2e77d.47a0479900504cb3ab4a1f626d174d2d")
    );
}

#[tokio::test]
async fn second_initialize_reuses_token_without_request() {
    let server = MockServer::start().await;
    mount_token_exchange(&server, 1).await;

    let provider = provider_for(&server);
    provider.initialize("the-code").await.unwrap();
    let cached = provider.access_token().await;

    let again = provider.initialize("the-code").await.unwrap();
    assert_eq!(Some(again), cached);
    // `expect(1)` is verified when `server` drops
}

#[tokio::test]
async fn seeded_token_skips_exchange_entirely() {
    let server = MockServer::start().await;
    mount_token_exchange(&server, 0).await;

    let provider = provider_for(&server).with_access_token("persisted");
    assert_eq!(provider.initialize("the-code").await.unwrap(), "persisted");
}

#[tokio::test]
async fn concurrent_first_initialize_exchanges_once() {
    let server = MockServer::start().await;
    mount_token_exchange(&server, 1).await;

    let provider = provider_for(&server);
    let (a, b) = futures::join!(provider.initialize("the-code"), provider.initialize("the-code"));

    let mut results = vec![a.unwrap(), b.unwrap()];
    results.sort();
    assert_eq!(
        results,
        vec![
            "fb2e77d.47a0479900504cb3ab4a1f626d174d2d".to_string(),
            TOKEN_BODY.to_string()
        ]
    );
}

#[tokio::test]
async fn initialize_failure_is_untagged_http_error() {
    let server = MockServer::start().await;
    let body = r#"{"error_type":"OAuthException","code":400,"error_message":"Matching code was not found or was already used."}"#;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.initialize("stale").await.unwrap_err();

    match err {
        HttpError::Api {
            status,
            message,
            body: got,
            ..
        } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Matching code was not found or was already used.");
            assert_eq!(got, body);
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(provider.access_token().await.is_none());
}

#[tokio::test]
async fn fetch_normalizes_data_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA))
        .and(query_param("access_token", "good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pagination": {},
            "meta": { "code": 200 },
            "data": [
                {
                    "id": "1574083_1",
                    "type": "image",
                    "link": "https://www.instagram.com/p/abc/",
                    "created_time": "1296710327",
                    "caption": { "text": "first" },
                    "user": { "id": "1574083", "username": "snoopdogg", "full_name": "Snoop Dogg" },
                    "images": { "standard_resolution": { "url": "https://scontent/1.jpg" } }
                },
                { "id": "1574083_2", "caption": null }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = provider_for(&server).fetch("good-token").await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "1574083_1");
    assert_eq!(posts[0].handle.as_deref(), Some("snoopdogg"));
    assert_eq!(posts[0].media_url.as_deref(), Some("https://scontent/1.jpg"));
    assert_eq!(posts[1].id, "1574083_2");
    assert!(posts.iter().all(|p| p.source == Source::Instagram));
}

#[tokio::test]
async fn expired_token_is_tagged_instagram_with_body() {
    let server = MockServer::start().await;
    let body = r#"{"meta":{"code":400,"error_type":"OAuthAccessTokenException","error_message":"The access_token provided is invalid."}}"#;
    Mock::given(method("GET"))
        .and(path(MEDIA))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server).fetch("expired").await.unwrap_err();

    assert_eq!(err.provider, Source::Instagram);
    assert_eq!(err.source_tag(), "instagram");
    assert_eq!(err.error.body(), Some(body));
}

#[tokio::test]
async fn malformed_body_is_a_tagged_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!doctype html>"))
        .mount(&server)
        .await;

    let err = provider_for(&server).fetch("t").await.unwrap_err();
    assert_eq!(err.provider, Source::Instagram);
    assert!(matches!(err.error, ProviderError::Http(HttpError::Decode(..))));
}

#[tokio::test]
async fn body_without_data_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meta": { "code": 200 } })))
        .mount(&server)
        .await;

    let err = provider_for(&server).fetch("t").await.unwrap_err();
    assert_eq!(err.provider, Source::Instagram);
    assert!(matches!(err.error, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn transport_error_is_tagged_instagram() {
    common::init_test_tracing();
    let provider = InstagramProvider::with_base_url(credentials(), "http://127.0.0.1:9").unwrap();

    let err = provider.fetch("t").await.unwrap_err();
    assert_eq!(err.provider, Source::Instagram);
    assert!(matches!(err.error, ProviderError::Http(HttpError::Network(_))));
}

#[tokio::test]
async fn provider_trait_needs_a_held_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MEDIA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let without: Box<dyn Provider> = Box::new(provider_for(&server));
    let err = without.fetch_posts().await.unwrap_err();
    assert_eq!(err.provider, Source::Instagram);
    assert!(matches!(err.error, ProviderError::MissingAccessToken));

    let with: Box<dyn Provider> = Box::new(provider_for(&server).with_access_token("held"));
    assert_eq!(with.source(), Source::Instagram);
    assert!(with.fetch_posts().await.unwrap().is_empty());
}
