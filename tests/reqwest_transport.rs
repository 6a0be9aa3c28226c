//! The default reqwest transport against a local HTTP server.

use serde::{Deserialize, Serialize};
use serene::{ApiHandler, Authentication, Method, StatusCode};
use serene_testing::*;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: u32,
    name: String,
}

fn widget(id: u32) -> Widget {
    Widget {
        id,
        name: format!("widget-{}", id),
    }
}

#[tokio::test]
async fn test_json_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/widgets/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(widget(1)))
        .expect(1)
        .mount(&server)
        .await;

    let handler = ApiHandler::builder()
        .use_source(server.uri(), Some("widgets"), None)
        .build()
        .unwrap();

    let response = handler.get::<Widget>(1).await.unwrap();
    assert_success(&response);
    assert_result(response.result(), &widget(1));
}

#[tokio::test]
async fn test_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let handler = ApiHandler::builder()
        .use_source(server.uri(), Some("widgets"), None)
        .build()
        .unwrap();

    let response = handler.delete(9).await.unwrap();
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_failure(&response, "Not Found");
    assert!(!response.has_exception());
}

#[tokio::test]
async fn test_slow_server_is_retried_until_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&server)
        .await;

    let handler = ApiHandler::builder()
        .use_source(server.uri(), Some("widgets"), None)
        .timeout(Duration::from_millis(200))
        .retry_attempts(2)
        .build()
        .unwrap();

    let response = handler.get_all::<Widget>().await.unwrap();
    assert_timed_out(&response, 3);
}

#[tokio::test]
async fn test_body_query_and_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/widgets/search"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer s3cret"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", "widget-admin/1.0"))
        .and(body_json(widget(3)))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![widget(3)]))
        .expect(1)
        .mount(&server)
        .await;

    let handler = ApiHandler::builder()
        .use_source(server.uri(), Some("widgets"), Some("v2"))
        .authentication(Authentication::bearer("s3cret"))
        .user_agent("widget-admin/1.0")
        .build()
        .unwrap();

    let response = handler
        .request_typed::<Vec<Widget>, _>(Method::Post, |r| {
            r.with_endpoint("search")
                .with_query(&[("page", 2)])
                .with_in_body_content(&widget(3))
        })
        .await
        .unwrap();

    assert_status(&response, StatusCode::CREATED);
    assert_result(response.result(), &vec![widget(3)]);
}

#[tokio::test]
async fn test_client_override_is_shared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(widget(1)))
        .expect(2)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let handler = ApiHandler::builder()
        .use_source(server.uri(), Some("widgets"), None)
        .client_override(client.clone())
        .build()
        .unwrap();

    assert!(handler.get::<Widget>(1).await.unwrap().was_successful());
    assert!(handler.dispose());

    // The caller's client outlives the handler.
    let again = client
        .get(format!("{}/api/widgets/1", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_failure() {
    let handler = ApiHandler::builder()
        .use_source("http://127.0.0.1:9", Some("widgets"), None)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let response = handler.get::<Widget>(1).await.unwrap();
    assert_no_status(&response);
    assert_failure(&response, "an exception occurred whilst performing a HTTP GET request");
}
