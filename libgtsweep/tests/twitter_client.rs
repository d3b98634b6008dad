//! HTTP-level tests for the Twitter client against a local mock server

use std::time::Duration;

use libgtsweep::error::{GtSweepError, PlatformError, SweepError};
use libgtsweep::platforms::twitter::TwitterClient;
use libgtsweep::platforms::Timeline;
use libgtsweep::sweeper::FetchRetry;
use libgtsweep::{CredentialField, CredentialSet, PartialCredentials, SweepConfig, Sweeper};
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> CredentialSet {
    PartialCredentials::default()
        .with(CredentialField::User, Some("alice".to_string()))
        .with(CredentialField::ConsumerKey, Some("ck-123456".to_string()))
        .with(CredentialField::ConsumerSecret, Some("cs-abcdef".to_string()))
        .with(CredentialField::AccessToken, Some("at-987654".to_string()))
        .with(CredentialField::AccessSecret, Some("as-zyxwvu".to_string()))
        .complete()
        .unwrap()
}

fn client(server: &MockServer) -> TwitterClient {
    TwitterClient::new(&credentials())
        .unwrap()
        .with_base_url(server.uri())
}

fn fast_config() -> SweepConfig {
    SweepConfig {
        action_delay: Duration::ZERO,
        retry: FetchRetry::new(2).with_base_delay(Duration::ZERO),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_page_sends_signed_extended_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .and(query_param("count", "100"))
        .and(query_param("tweet_mode", "extended"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "full_text": "my own post", "retweeted": false},
            {"id": 1, "full_text": "RT @bob: theirs", "retweeted": true,
             "retweeted_status": {"id": 77}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server).fetch_page(100).await.unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].text, "my own post");
    assert!(!page[0].is_repost);
    assert!(page[1].is_repost);

    let requests = server.received_requests().await.unwrap_or_default();
    let auth = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"ck-123456\""));
    assert!(auth.contains("oauth_token=\"at-987654\""));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(!auth.contains("cs-abcdef"));
    assert!(!auth.contains("as-zyxwvu"));

    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("gtsweep/"));
}

#[tokio::test]
async fn test_destroy_and_unretweet_paths() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/statuses/destroy/42.json"))
        .and(query_param("tweet_mode", "extended"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 42, "full_text": "gone"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statuses/unretweet/43.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 43, "full_text": "original"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.destroy(42).await.unwrap().text, "gone");
    assert_eq!(client.unretweet(43).await.unwrap().text, "original");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"code": 32, "message": "Could not authenticate you."}]
        })))
        .mount(&server)
        .await;
    Mock::given(path("/statuses/destroy/1.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": 144, "message": "No status found with that ID."}]
        })))
        .mount(&server)
        .await;
    Mock::given(path("/statuses/destroy/2.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/statuses/destroy/3.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Over capacity"))
        .mount(&server)
        .await;
    Mock::given(path("/statuses/unretweet/4.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.fetch_page(100).await,
        Err(PlatformError::Authentication(_))
    ));
    assert!(matches!(client.destroy(1).await, Err(PlatformError::NotFound(_))));
    assert!(matches!(client.destroy(2).await, Err(PlatformError::RateLimit { .. })));
    assert!(matches!(client.destroy(3).await, Err(PlatformError::Network(_))));
    assert!(matches!(client.unretweet(4).await, Err(PlatformError::Api(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = TwitterClient::new(&credentials())
        .unwrap()
        .with_base_url("http://127.0.0.1:1");
    assert!(matches!(
        client.fetch_page(10).await,
        Err(PlatformError::Network(_))
    ));
}

#[tokio::test]
async fn test_full_sweep_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "full_text": "first", "retweeted": false},
            {"id": 11, "full_text": "RT @carol: shared", "retweeted": true}
        ])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statuses/destroy/10.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 10, "full_text": "first"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statuses/unretweet/11.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 5, "full_text": "shared"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let report = Sweeper::new(&client, fast_config()).run().await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.unretweeted, 1);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_sweep_aborts_on_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = Sweeper::new(&client, fast_config()).run().await.unwrap_err();

    assert!(matches!(
        err,
        GtSweepError::Sweep(SweepError::FetchFailed {
            source: PlatformError::Authentication(_),
            ..
        })
    ));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_sweep_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server);
    let report = Sweeper::new(&client, fast_config()).run().await.unwrap();

    assert_eq!(report.fetch_retries, 1);
    assert_eq!(report.pages, 1);
}

#[tokio::test]
async fn test_rate_limit_reset_header_is_read() {
    let server = MockServer::start().await;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    Mock::given(method("POST"))
        .and(path("/statuses/destroy/8.json"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-reset", (now + 300).to_string().as_str())
                .set_body_json(json!({"errors": [{"code": 88, "message": "Rate limit exceeded"}]})),
        )
        .mount(&server)
        .await;

    let err = client(&server).destroy(8).await.unwrap_err();
    let wait = err.retry_after().unwrap();
    assert!(wait > Duration::from_secs(290) && wait <= Duration::from_secs(300));
    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_sweep_survives_rate_limited_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 30, "full_text": "stubborn", "retweeted": false}
        ])))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statuses/destroy/30.json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statuses/destroy/30.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 30, "full_text": "stubborn"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let report = Sweeper::new(&client, fast_config()).run().await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.throttled_pages, 1);
    assert_eq!(report.pages, 3);
}
