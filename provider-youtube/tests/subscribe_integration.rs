//! End-to-end checks of the subscription requester through its public API.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::Credential;
use provider_youtube::{
    Precondition, SubscribeError, SubscriptionRequester, DEFAULT_FAILURE_MESSAGE,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Replays scripted outcomes and records every request it sees.
#[derive(Default)]
struct RecordingHttpClient {
    outcomes: Mutex<VecDeque<BridgeResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    fn with_outcome(outcome: BridgeResult<HttpResponse>) -> Arc<Self> {
        let client = Self::default();
        client.outcomes.lock().unwrap().push_back(outcome);
        Arc::new(client)
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl HttpClient for RecordingHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::OperationFailed("no scripted outcome".into())))
    }
}

fn ok(status: u16, body: &str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    })
}

fn token() -> Credential {
    Credential::new("tok123", "https://www.googleapis.com/auth/youtube")
}

#[tokio::test]
async fn subscribes_with_mocked_success() {
    let http = RecordingHttpClient::with_outcome(ok(200, r#"{"id":"sub-1"}"#));
    let requester = SubscriptionRequester::new(http.clone());

    let result = requester
        .subscribe(Some(&token()), "UClE78KZQ32HSA_Ff_vo2MuQ")
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(http.calls(), 1);

    let request = http.last_request();
    assert_eq!(request.method, HttpMethod::Post);
    assert!(request.url.ends_with("/subscriptions?part=snippet"));
    assert_eq!(
        request.headers.get("Authorization").map(String::as_str),
        Some("Bearer tok123")
    );

    let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "snippet": {
                "resourceId": {
                    "kind": "youtube#channel",
                    "channelId": "UClE78KZQ32HSA_Ff_vo2MuQ"
                }
            }
        })
    );
}

#[tokio::test]
async fn whitespace_channel_records_zero_calls() {
    let http = RecordingHttpClient::with_outcome(ok(200, "{}"));
    let requester = SubscriptionRequester::new(http.clone());

    let result = requester.subscribe(Some(&token()), "  ").await;

    assert_eq!(
        result,
        Err(SubscribeError::MissingPrecondition(Precondition::ChannelId))
    );
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn missing_credential_records_zero_calls() {
    let http = RecordingHttpClient::with_outcome(ok(200, "{}"));
    let requester = SubscriptionRequester::new(http.clone());

    let result = requester.subscribe(None, "UClE78KZQ32HSA_Ff_vo2MuQ").await;

    assert_eq!(
        result,
        Err(SubscribeError::MissingPrecondition(Precondition::Credential))
    );
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let http = RecordingHttpClient::with_outcome(ok(503, "Service Unavailable"));
    let requester = SubscriptionRequester::new(http.clone());

    let result = requester.subscribe(Some(&token()), "UC1").await;

    assert_eq!(
        result,
        Err(SubscribeError::HttpFailure {
            status: 503,
            message: DEFAULT_FAILURE_MESSAGE.to_string(),
        })
    );
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn connection_refused_is_a_transport_fault() {
    let http = RecordingHttpClient::with_outcome(Err(BridgeError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))));
    let requester = SubscriptionRequester::new(http.clone());

    let result = requester.subscribe(Some(&token()), "UC1").await;

    match result {
        Err(SubscribeError::TransportFault(description)) => {
            assert!(description.contains("connection refused"))
        }
        other => panic!("expected transport fault, got {:?}", other),
    }
    assert_eq!(http.calls(), 1);
}

#[tokio::test]
async fn api_message_reaches_the_caller() {
    let http = RecordingHttpClient::with_outcome(ok(
        403,
        r#"{"error":{"code":403,"message":"The request is not properly authorized."}}"#,
    ));
    let requester = SubscriptionRequester::new(http);

    let err = requester
        .subscribe(Some(&token()), "UC1")
        .await
        .unwrap_err();

    assert_eq!(err.message(), "The request is not properly authorized.");
    assert_eq!(err.status(), Some(403));
}
