//! Interpretation of the body returned by an `Execute` request.
//!
//! The service answers an asynchronous execute with an `ExecuteResponse`
//! whose `statusLocation` carries `executionId=<id>`. Any body containing an
//! `ExceptionReport` is a refusal.

const EXCEPTION_MARKER: &str = "ExceptionReport";
const EXECUTION_ID_MARKER: &str = "executionId=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResponse {
    Accepted { execution_id: String },
    Exception(String),
    MissingExecutionId,
}

pub fn parse_submission(body: &str) -> SubmissionResponse {
    if body.contains(EXCEPTION_MARKER) {
        return SubmissionResponse::Exception(exception_text(body));
    }

    match extract_execution_id(body) {
        Some(execution_id) => SubmissionResponse::Accepted { execution_id },
        None => SubmissionResponse::MissingExecutionId,
    }
}

/// The id following the first `executionId=` marker, up to the next
/// query, quote, tag or whitespace delimiter.
pub fn extract_execution_id(body: &str) -> Option<String> {
    let start = body.find(EXECUTION_ID_MARKER)? + EXECUTION_ID_MARKER.len();
    let id: String = body[start..]
        .chars()
        .take_while(|c| !matches!(c, '&' | '"' | '\'' | '<') && !c.is_whitespace())
        .collect();

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Best-effort human readable text of an exception report.
fn exception_text(body: &str) -> String {
    let open = "ExceptionText>";
    if let Some(start) = body.find(open).map(|i| i + open.len()) {
        if let Some(len) = body[start..].find('<') {
            let text = body[start..start + len].trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_marker() {
        assert_eq!(
            parse_submission("Body executionId=123"),
            SubmissionResponse::Accepted {
                execution_id: "123".to_string()
            }
        );
    }

    #[test]
    fn test_marker_inside_status_location() {
        let body = r#"<wps:ExecuteResponse statusLocation="https://eo.example/geoserver/ows?service=WPS&amp;request=GetExecutionStatus&amp;executionId=6f1c-22ab"/>"#;
        assert_eq!(extract_execution_id(body).as_deref(), Some("6f1c-22ab"));
    }

    #[test]
    fn test_exception_wins_over_marker() {
        let body = "<ows:ExceptionReport><ows:Exception><ows:ExceptionText>Unknown layer</ows:ExceptionText></ows:Exception></ows:ExceptionReport> executionId=1";
        assert_eq!(
            parse_submission(body),
            SubmissionResponse::Exception("Unknown layer".to_string())
        );
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(parse_submission("<ok/>"), SubmissionResponse::MissingExecutionId);
        assert_eq!(parse_submission("executionId="), SubmissionResponse::MissingExecutionId);
    }
}
