//! Response assertions shared across test suites.

use alfred_types::{ResponseStatus, ToolResponse};

/// Panic with the response's message when it is not a success.
pub fn assert_success(response: &ToolResponse) {
    assert_eq!(
        response.status,
        ResponseStatus::Success,
        "expected success, got: {}",
        response.message
    );
}

/// Assert an error response whose message contains `needle`.
pub fn assert_error_containing(response: &ToolResponse, needle: &str) {
    assert_eq!(
        response.status,
        ResponseStatus::Error,
        "expected an error, got success: {}",
        response.message
    );
    assert!(
        response.message.contains(needle),
        "error message missing '{needle}': {}",
        response.message
    );
}

/// The `current_state` field of a successful response's data payload.
pub fn current_state(response: &ToolResponse) -> String {
    response
        .data
        .as_ref()
        .and_then(|d| d.get("current_state"))
        .and_then(|s| s.as_str())
        .unwrap_or_else(|| panic!("response carries no current_state: {}", response.message))
        .to_string()
}
