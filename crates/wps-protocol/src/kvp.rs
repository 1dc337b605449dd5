//! Key-value-pair query parameters for WPS requests.

pub const SERVICE: &str = "WPS";
pub const VERSION: &str = "1.0.0";

pub const REQUEST_EXECUTE: &str = "EXECUTE";
pub const REQUEST_STATUS: &str = "GetExecutionStatus";

/// Query pairs for an `Execute` POST.
pub fn execute_params(access_token: &str) -> Vec<(String, String)> {
    vec![
        ("access_token".to_string(), access_token.to_string()),
        ("SERVICE".to_string(), SERVICE.to_string()),
        ("VERSION".to_string(), VERSION.to_string()),
        ("REQUEST".to_string(), REQUEST_EXECUTE.to_string()),
    ]
}

/// Query pairs for a `GetExecutionStatus` GET.
pub fn status_params(access_token: &str, execution_id: &str) -> Vec<(String, String)> {
    vec![
        ("access_token".to_string(), access_token.to_string()),
        ("SERVICE".to_string(), SERVICE.to_string()),
        ("VERSION".to_string(), VERSION.to_string()),
        ("REQUEST".to_string(), REQUEST_STATUS.to_string()),
        ("EXECUTIONID".to_string(), execution_id.to_string()),
    ]
}

/// Append the bearer token to an output reference, making it directly
/// downloadable.
pub fn authenticated_href(href: &str, access_token: &str) -> String {
    let separator = match href.find('?') {
        None => "?",
        Some(_) if href.ends_with('?') || href.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}access_token={}", href, separator, access_token)
}
