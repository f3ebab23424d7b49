//! Retry, timeout and classification behaviour of remote calls

mod common;

use async_trait::async_trait;
use common::*;
use post_planner::client::{
    Credential, CredentialProvider, GenerationClient, RemoteCallClient, StaticCredentialProvider,
};
use post_planner::models::{
    GenerateIdeasRequest, GenerateIdeasResponse, GeneratePostRequest, GenerateVariantsRequest,
    IdeaRef, Platform, QuotaKind,
};
use post_planner::resilience::{ErrorKind, RawFailure, RetryPolicy};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEADLINE: Duration = Duration::from_secs(10);

fn signed_in() -> Arc<StaticCredentialProvider> {
    Arc::new(StaticCredentialProvider::new(Credential::bearer("token-1")))
}

fn client(transport: &Arc<ScriptedTransport>) -> RemoteCallClient {
    RemoteCallClient::new(transport.clone(), signed_in())
}

fn server_error() -> Reply {
    Reply::Fail(RawFailure::with_status(500, "Internal server error"))
}

/// Hands out a new token on every request
#[derive(Default)]
struct RotatingCredentials {
    issued: AtomicUsize,
}

#[async_trait]
impl CredentialProvider for RotatingCredentials {
    async fn credential(&self) -> Option<Credential> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Credential::bearer(format!("token-{n}")))
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success_returns_decoded_value() {
    let transport = Arc::new(ScriptedTransport::new(vec![Reply::Ok(json!({ "value": 7 }))]));

    let report = client(&transport)
        .call_with_attempts::<Value>("check-quota", json!({}), DEADLINE)
        .await;

    assert_eq!(report.result.as_ref().unwrap()["value"], 7);
    assert_eq!(report.attempt_count(), 1);
    assert!(report.attempts[0].succeeded());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_one_two_four_seconds() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        server_error(),
        server_error(),
        server_error(),
        Reply::Ok(json!({ "ok": true })),
    ]));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    assert!(report.result.is_ok());
    assert_eq!(report.attempt_count(), 4);
    assert_eq!(
        report.inter_attempt_delays(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );

    let invocations = transport.invocations();
    assert_eq!(invocations[3].at - invocations[0].at, Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_is_four_attempts() {
    let transport = Arc::new(ScriptedTransport::always(server_error()));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    let error = report.result.as_ref().unwrap_err();
    assert_eq!(error.kind, ErrorKind::ApiError);
    assert_eq!(error.message, "Internal server error");
    assert!(error.offers_retry());
    assert_eq!(report.attempt_count(), 4);
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_quota_and_validation_failures_are_not_retried() {
    let cases = [
        (RawFailure::new("Monthly quota exceeded"), ErrorKind::QuotaExceeded),
        (
            RawFailure::with_status(400, "Invalid payload: idea is required"),
            ErrorKind::ValidationError,
        ),
        (
            RawFailure::with_status(429, "Too Many Requests").declared(ErrorKind::QuotaExceeded),
            ErrorKind::QuotaExceeded,
        ),
    ];

    for (failure, expected_kind) in cases {
        let transport = Arc::new(ScriptedTransport::always(Reply::Fail(failure)));

        let report = client(&transport)
            .call_with_attempts::<Value>("generate-ideas", json!({}), DEADLINE)
            .await;

        let error = report.result.as_ref().unwrap_err();
        assert_eq!(error.kind, expected_kind);
        assert!(!error.offers_retry());
        assert_eq!(report.attempt_count(), 1, "{expected_kind} must not be retried");
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_for_server_retry_after() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Fail(RawFailure::with_status(429, "Too Many Requests").retry_after(5)),
        Reply::Ok(json!({})),
    ]));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    assert!(report.result.is_ok());
    assert_eq!(report.inter_attempt_delays(), vec![Duration::from_secs(5)]);
    assert_eq!(
        report.attempts[0].error().map(|e| e.kind),
        Some(ErrorKind::RateLimit)
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_without_retry_after_waits_sixty_seconds() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Fail(RawFailure::with_status(429, "Too Many Requests")),
        Reply::Ok(json!({})),
    ]));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    assert_eq!(report.inter_attempt_delays(), vec![Duration::from_secs(60)]);
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_ends_at_deadline() {
    let transport = Arc::new(ScriptedTransport::always(Reply::Hang));
    let client = client(&transport).with_retry_policy(RetryPolicy::no_retry());

    let started = Instant::now();
    let error = client
        .call::<Value>("generate-post", json!({}), Duration::from_millis(500))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried_then_recovers() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Hang,
        Reply::Delayed(Duration::from_millis(200), Box::new(Reply::Ok(json!({})))),
    ]));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), Duration::from_secs(2))
        .await;

    assert!(report.result.is_ok());
    assert_eq!(
        report.attempts[0].error().map(|e| e.kind),
        Some(ErrorKind::Timeout)
    );
    assert_eq!(report.attempts[0].elapsed, Duration::from_secs(2));
    assert_eq!(report.attempts[1].elapsed, Duration::from_millis(200));
    assert_eq!(report.inter_attempt_delays(), vec![Duration::from_secs(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_session_fails_without_contacting_service() {
    let transport = Arc::new(ScriptedTransport::always(Reply::Ok(json!({}))));
    let client = RemoteCallClient::new(
        transport.clone(),
        Arc::new(StaticCredentialProvider::signed_out()),
    );

    let report = client
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    let error = report.result.as_ref().unwrap_err();
    assert_eq!(error.kind, ErrorKind::ApiError);
    assert!(error.message.contains("session has expired"));
    assert!(!error.offers_retry());
    assert_eq!(report.attempt_count(), 0);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials_are_terminal() {
    let transport = Arc::new(ScriptedTransport::always(Reply::Fail(
        RawFailure::with_status(401, "JWT expired"),
    )));

    let report = client(&transport)
        .call_with_attempts::<Value>("generate-post", json!({}), DEADLINE)
        .await;

    assert_eq!(report.attempt_count(), 1);
    assert!(report.result.unwrap_err().message.contains("sign in again"));
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_fetches_a_fresh_credential() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        server_error(),
        Reply::Ok(json!({})),
    ]));
    let client = RemoteCallClient::new(transport.clone(), Arc::new(RotatingCredentials::default()));

    client
        .call::<Value>("generate-post", json!({}), DEADLINE)
        .await
        .unwrap();

    let tokens: Vec<String> = transport.invocations().into_iter().map(|i| i.token).collect();
    assert_eq!(tokens, vec!["token-1", "token-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_success_is_terminal_api_error() {
    let transport = Arc::new(ScriptedTransport::always(Reply::Ok(json!({ "unexpected": true }))));

    let report = client(&transport)
        .call_with_attempts::<GenerateIdeasResponse>("generate-ideas", json!({}), DEADLINE)
        .await;

    let error = report.result.as_ref().unwrap_err();
    assert_eq!(error.kind, ErrorKind::ApiError);
    assert!(!error.offers_retry());
    assert_eq!(report.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_generation_client_clamps_idea_count() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Ok(ideas_body(3)),
        Reply::Ok(ideas_body(15)),
    ]));
    let generation = GenerationClient::new(client(&transport));

    let response = generation
        .generate_ideas(GenerateIdeasRequest {
            count: Some(50),
            ..GenerateIdeasRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(response.ideas.len(), 3);
    assert_eq!(response.quota_remaining, 99);

    generation
        .generate_ideas(GenerateIdeasRequest::default())
        .await
        .unwrap();

    let invocations = transport.invocations();
    assert_eq!(invocations[0].operation, "generate-ideas");
    assert_eq!(invocations[0].payload["count"], 20);
    assert_eq!(invocations[1].payload["count"], 15);
}

#[tokio::test(start_paused = true)]
async fn test_generation_client_validates_locally() {
    let transport = Arc::new(ScriptedTransport::always(Reply::Ok(json!({}))));
    let generation = GenerationClient::new(client(&transport));

    let incomplete = IdeaRef {
        id: None,
        title: "  ".to_string(),
        description: "Something".to_string(),
        category: None,
    };
    let error = generation
        .generate_post(GeneratePostRequest::for_platform(incomplete, Platform::Linkedin))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::ValidationError);

    let error = generation
        .generate_variants(GenerateVariantsRequest {
            post_id: "post-1".to_string(),
            variations: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::ValidationError);

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_quota_check_uses_its_own_deadline() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Reply::Delayed(Duration::from_secs(6), Box::new(Reply::Ok(quota_body()))),
        Reply::Ok(quota_body()),
    ]));
    let generation = GenerationClient::new(client(&transport));

    let started = Instant::now();
    let quota = generation.get_quota().await.unwrap();

    // First attempt cut at 5s, then one second of backoff
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert!(quota.can_generate(QuotaKind::Ideas, 15));
    assert!(!quota.can_generate(QuotaKind::Posts, 1));
    assert_eq!(transport.invocations()[0].payload, json!({}));
}
