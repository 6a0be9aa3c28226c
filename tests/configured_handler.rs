//! Handlers built from configuration, and the blocking facade.

use serene::serene_config::{ApiDefaults, ConfigManager, FileFormat};
use serene::{ApiError, ApiHandler, BlockingApiHandler, Method, StatusCode};
use serene_testing::*;
use std::io::Write;
use std::time::Duration;

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn ok_provider() -> MockConnectionProvider {
    MockConnectionProvider::managed(MockTransport::new([MockResponse::json(&[1, 2, 3])]))
}

#[tokio::test]
async fn test_handler_from_toml_section() {
    let file = write_file(
        ".toml",
        r#"
            [inventory]
            source = "http://x.test"
            resource = "parts"
            resource_path = "v1"
            timeout = 12
            retry_count = 3
        "#,
    );
    let config = ConfigManager::new();
    config
        .load_file(file.path().to_str().unwrap(), FileFormat::Toml)
        .unwrap();

    let provider = ok_provider();
    let handler = ApiHandler::builder()
        .use_configuration(&config, Some("inventory"))
        .connection_provider(provider.clone())
        .build()
        .unwrap();

    assert_eq!(handler.settings().source().as_str(), "http://x.test/v1/parts");
    assert_eq!(handler.settings().timeout(), Duration::from_secs(12));
    assert_eq!(handler.settings().retry_attempts(), 3);

    let response = handler.get_all::<u32>().await.unwrap();
    assert_result(response.result(), &vec![1, 2, 3]);
    assert_eq!(
        provider.transport().last_request().unwrap().url.as_str(),
        "http://x.test/v1/parts"
    );
}

#[test]
fn test_unset_values_fall_back_to_defaults() {
    let config = ConfigManager::new();
    config.set("source", "http://x.test").unwrap();
    config.set("timeout", "0").unwrap();

    let handler = ApiHandler::builder()
        .use_configuration(&config, None)
        .defaults(ApiDefaults {
            timeout: Duration::from_secs(7),
            retry_count: 1,
            ..ApiDefaults::default()
        })
        .connection_provider(ok_provider())
        .build()
        .unwrap();

    assert_eq!(handler.settings().source().as_str(), "http://x.test/api/");
    assert_eq!(handler.settings().timeout(), Duration::from_secs(7));
    assert_eq!(handler.settings().retry_attempts(), 1);
}

#[test]
fn test_explicit_settings_win_over_configuration() {
    let config = ConfigManager::new();
    config.set("source", "http://x.test").unwrap();
    config.set("retry_count", 4).unwrap();

    let handler = ApiHandler::builder()
        .use_configuration(&config, None)
        .retry_attempts(0)
        .timeout(Duration::from_secs(1))
        .connection_provider(ok_provider())
        .build()
        .unwrap();

    assert_eq!(handler.settings().retry_attempts(), 0);
    assert_eq!(handler.settings().timeout(), Duration::from_secs(1));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = ConfigManager::new();
    config.set("source", "http://x.test").unwrap();
    config.set("timeout", -5).unwrap();

    let result = ApiHandler::builder()
        .use_configuration(&config, None)
        .connection_provider(ok_provider())
        .build();
    assert!(matches!(result, Err(ApiError::Config(_))));

    let result = ApiHandler::builder()
        .use_configuration(&ConfigManager::new(), None)
        .build();
    assert!(result.is_err());
}

#[test]
fn test_blocking_facade() {
    let transport = MockTransport::new([
        MockResponse::status(StatusCode::ACCEPTED).for_method(Method::Put),
        MockResponse::json(&"hinge").for_route("/api/parts/4"),
        MockResponse::status(StatusCode::GONE),
    ]);
    let provider = MockConnectionProvider::managed(transport);
    let handler = ApiHandler::builder()
        .use_source("http://x.test", Some("parts"), None)
        .connection_provider(provider.clone())
        .build()
        .unwrap();
    let blocking = BlockingApiHandler::new(handler).unwrap();

    let part = blocking.get::<String>(4).unwrap();
    assert_result(part.result(), &"hinge".to_string());

    let gone = blocking.delete(5).unwrap();
    assert_status(&gone, StatusCode::GONE);

    let replaced = blocking
        .request(Method::Put, |r| r.with_in_body_content(&"latch"))
        .unwrap();
    assert_status(&replaced, StatusCode::ACCEPTED);

    assert!(blocking.dispose());
    assert!(matches!(blocking.get::<String>(4), Err(ApiError::Disposed)));
    assert_eq!(provider.disposed(), 3);
}
