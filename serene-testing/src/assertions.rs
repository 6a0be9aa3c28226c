// Assertions for response envelopes

use http::StatusCode;
use serene_http_client::ApiResponse;
use std::fmt::Debug;

/// Assert that a response carries a specific status code
pub fn assert_status(response: &ApiResponse, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that no response was received at all
pub fn assert_no_status(response: &ApiResponse) {
    assert!(
        response.status().is_none(),
        "Expected no status, got {}",
        response.status()
    );
}

/// Assert that a response was successful
pub fn assert_success(response: &ApiResponse) {
    assert!(
        response.was_successful(),
        "Expected a successful response, got {} ({:?})",
        response.status(),
        response.message()
    );
}

/// Assert that a response failed with the given message
pub fn assert_failure(response: &ApiResponse, message: &str) {
    assert!(
        !response.was_successful(),
        "Expected a failed response, got {}",
        response.status()
    );
    assert_eq!(response.message(), Some(message), "Failure messages do not match");
}

/// Assert that a response failed because every attempt timed out
pub fn assert_timed_out(response: &ApiResponse, attempts: u32) {
    assert_no_status(response);
    match response.exception() {
        Some(serene_http_client::ApiException::Timeout { attempts: actual, .. }) => {
            assert_eq!(*actual, attempts, "Expected {} attempts, got {}", attempts, actual)
        }
        other => panic!("Expected a timeout exception, got {:?}", other),
    }
}

/// Assert that a typed result equals the expected value
pub fn assert_result<T>(result: Option<&T>, expected: &T)
where
    T: PartialEq + Debug,
{
    assert_eq!(result, Some(expected), "Results do not match");
}
