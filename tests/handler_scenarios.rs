//! End-to-end handler behaviour over mocked transports.

use serde::{Deserialize, Serialize};
use serene::serene_events::{EventBus, EventHandlerError, FnEventHandler, TypedEventHandler};
use serene::{
    ApiError, ApiHandler, Method, ResponseEvent, RetryEvent, StatusCode, TypedApiResponse,
};
use serene_testing::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: u32,
}

fn handler(provider: &MockConnectionProvider) -> ApiHandler {
    ApiHandler::builder()
        .use_source("http://x.test", Some("widgets"), None)
        .connection_provider(provider.clone())
        .build()
        .unwrap()
}

fn timing_out_handler(provider: &MockConnectionProvider, retry_attempts: u32) -> ApiHandler {
    ApiHandler::builder()
        .use_source("http://x.test", Some("widgets"), None)
        .timeout(Duration::from_secs(2))
        .retry_attempts(retry_attempts)
        .connection_provider(provider.clone())
        .build()
        .unwrap()
}

fn hanging() -> MockTransport {
    MockTransport::new([MockResponse::status(StatusCode::OK).delayed(Duration::from_secs(3), u32::MAX)])
}

#[tokio::test]
async fn test_typed_get_deserializes_the_body() {
    let transport = MockTransport::new([MockResponse::json(&Widget { id: 1 }).for_method(Method::Get)]);
    let provider = MockConnectionProvider::managed(transport.clone());

    let response = handler(&provider).get::<Widget>(1).await.unwrap();

    assert_success(&response);
    assert_result(response.result(), &Widget { id: 1 });
    assert_eq!(
        transport.last_request().unwrap().url.as_str(),
        "http://x.test/api/widgets/1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_exhausts_the_retry_budget() {
    let provider = MockConnectionProvider::managed(hanging());
    let handler = timing_out_handler(&provider, 2);

    let started = tokio::time::Instant::now();
    let response: TypedApiResponse<Widget> = handler.get(1).await.unwrap();

    assert_timed_out(&response, 3);
    assert_failure(&response, "request timed out; retry limit reached");
    assert!(response.result().is_none());
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!(provider.transport().request_count(), 3);
}

#[tokio::test]
async fn test_http_failure_carries_the_reason_phrase() {
    let transport = MockTransport::new([MockResponse::status(StatusCode::NOT_FOUND)]);
    let provider = MockConnectionProvider::managed(transport);

    let response = handler(&provider).get::<Widget>(9).await.unwrap();

    assert_status(&response, StatusCode::NOT_FOUND);
    assert_failure(&response, "Not Found");
    assert!(!response.has_exception());
}

#[tokio::test]
async fn test_malformed_body_is_a_deserialization_failure() {
    let transport = MockTransport::new([MockResponse::raw(StatusCode::OK, "{ not json")]);
    let provider = MockConnectionProvider::managed(transport);

    let response = handler(&provider).get::<Widget>(1).await.unwrap();

    assert_status(&response, StatusCode::OK);
    assert_failure(&response, "could not deserialize returned value");
    assert!(response.exception().is_some_and(|e| e.is_deserialization()));
}

#[tokio::test(start_paused = true)]
async fn test_attempt_count_follows_retry_attempts() {
    for retry_attempts in 1..=4 {
        let provider = MockConnectionProvider::managed(hanging());
        let handler = timing_out_handler(&provider, retry_attempts);

        let response = handler.delete(1).await.unwrap();

        assert_timed_out(&response, retry_attempts + 1);
        assert_eq!(provider.acquired(), retry_attempts as usize + 1);
        assert_eq!(provider.disposed(), provider.acquired());
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_makes_a_single_attempt() {
    let provider = MockConnectionProvider::managed(hanging());
    let handler = timing_out_handler(&provider, 0);

    let response = handler.delete(1).await.unwrap();

    assert_timed_out(&response, 1);
    assert_eq!(provider.transport().request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_once_the_delay_ends() {
    let transport = MockTransport::new([
        MockResponse::json(&Widget { id: 5 }).delayed(Duration::from_secs(3), 2)
    ]);
    let provider = MockConnectionProvider::override_client(transport);
    let handler = timing_out_handler(&provider, 2);

    let response = handler.get::<Widget>(5).await.unwrap();

    assert_success(&response);
    assert_result(response.result(), &Widget { id: 5 });
    assert_eq!(provider.transport().request_count(), 3);
    // The caller-owned transport is acquired once and never disposed.
    assert_eq!((provider.acquired(), provider.disposed()), (1, 0));
}

#[tokio::test]
async fn test_success_has_no_message_or_exception() {
    let transport = MockTransport::new([
        MockResponse::status(StatusCode::NO_CONTENT).for_method(Method::Delete),
        MockResponse::json(&Widget { id: 2 }).with_status(StatusCode::CREATED),
    ]);
    let provider = MockConnectionProvider::managed(transport);
    let handler = handler(&provider);

    let deleted = handler.delete(2).await.unwrap();
    let created = handler.create(&Widget { id: 2 }).await.unwrap();

    for response in [&deleted, &*created] {
        assert_success(response);
        assert!(response.message().is_none());
        assert!(response.exception().is_none());
        assert!(!response.has_exception());
    }
}

#[tokio::test]
async fn test_body_on_get_or_delete_is_rejected_without_a_call() {
    let transport = MockTransport::new([MockResponse::status(StatusCode::OK)]);
    let provider = MockConnectionProvider::managed(transport.clone());
    let handler = handler(&provider);

    for method in [Method::Get, Method::Delete] {
        let result = handler
            .request(method, |r| r.with_in_body_content(&Widget { id: 1 }))
            .await;
        assert!(matches!(result, Err(ApiError::BodyNotAllowed(m)) if m == method));
    }

    assert_eq!(provider.acquired(), 0);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let transport = MockTransport::new([MockResponse::json(&Widget { id: 1 })]);
    let provider = MockConnectionProvider::managed(transport);
    let handler = handler(&provider);

    assert!(handler.get::<Widget>(1).await.unwrap().was_successful());

    assert!(handler.dispose());
    assert!(!handler.dispose());
    assert!(handler.is_disposed());
    assert!(matches!(handler.get::<Widget>(1).await, Err(ApiError::Disposed)));
    assert_eq!(provider.acquired(), 1);
}

#[tokio::test]
async fn test_transport_error_names_the_method() {
    let transport = MockTransport::new([MockResponse::transport_error("connection reset")]);
    let provider = MockConnectionProvider::managed(transport);

    let response = handler(&provider).update(&Widget { id: 4 }).await.unwrap();

    assert_no_status(&response);
    assert_failure(
        &response,
        "an exception occurred whilst performing a HTTP PATCH request",
    );
    assert!(response.exception().is_some_and(|e| e.is_transport()));
}

#[tokio::test]
async fn test_query_and_content_reach_the_transport() {
    #[derive(Serialize)]
    struct Search {
        colour: &'static str,
        page: u32,
        note: Option<String>,
    }

    let transport = MockTransport::new([
        MockResponse::json(&[Widget { id: 7 }]).for_route("/api/widgets/search"),
        MockResponse::json(&Widget { id: 8 }).for_content(&Widget { id: 8 }),
    ]);
    let provider = MockConnectionProvider::managed(transport.clone());
    let handler = handler(&provider);

    let found = handler
        .request_typed::<Vec<Widget>, _>(Method::Get, |r| {
            r.with_endpoint("search").with_query(&Search {
                colour: "blue",
                page: 2,
                note: None,
            })
        })
        .await
        .unwrap();
    assert_result(found.result(), &vec![Widget { id: 7 }]);
    assert_eq!(
        transport.requests()[0].url.as_str(),
        "http://x.test/api/widgets/search?colour=blue&page=2"
    );

    let replaced = handler.replace(&Widget { id: 8 }).await.unwrap();
    assert_result(replaced.result(), &Widget { id: 8 });
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_events_are_published() {
    let retries = Arc::new(Mutex::new(Vec::new()));
    let responses = Arc::new(Mutex::new(Vec::new()));

    let bus = EventBus::new();
    let seen = retries.clone();
    bus.subscribe::<RetryEvent, _>(TypedEventHandler::new(FnEventHandler::new(
        move |event: &RetryEvent| -> Result<(), EventHandlerError> {
            seen.lock().unwrap().push((event.attempt, event.retries_remaining));
            Ok(())
        },
    )));
    let seen = responses.clone();
    bus.subscribe::<ResponseEvent, _>(TypedEventHandler::new(FnEventHandler::new(
        move |event: &ResponseEvent| -> Result<(), EventHandlerError> {
            seen.lock().unwrap().push(event.successful);
            Ok(())
        },
    )));

    let provider = MockConnectionProvider::managed(hanging());
    let handler = ApiHandler::builder()
        .use_source("http://x.test", Some("widgets"), None)
        .timeout(Duration::from_secs(2))
        .retry_attempts(2)
        .connection_provider(provider)
        .event_bus(bus)
        .build()
        .unwrap();

    let response = handler.delete(1).await.unwrap();
    assert!(!response.was_successful());

    // Listeners run on spawned tasks.
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(*retries.lock().unwrap(), vec![(1, 1), (2, 0)]);
    assert_eq!(*responses.lock().unwrap(), vec![false]);
}
