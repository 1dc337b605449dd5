//! Status documents as returned by the processing service.

use wps_protocol::{parse_execution_status, ExecutionStatus, ProcessPhase, WpsParseError};

const SUCCEEDED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1" xmlns:xlink="http://www.w3.org/1999/xlink" service="WPS" version="1.0.0">
  <wps:Process wps:processVersion="1.0.0">
    <ows:Identifier>gs:Download</ows:Identifier>
  </wps:Process>
  <wps:Status creationTime="2024-03-01T10:15:00.000Z">
    <wps:ProcessSucceeded>Process succeeded.</wps:ProcessSucceeded>
  </wps:Status>
  <wps:ProcessOutputs>
    <wps:Output>
      <ows:Identifier>result</ows:Identifier>
      <ows:Title>Output</ows:Title>
      <wps:Reference href="https://eo.example/geoserver/ows?service=WPS&amp;version=1.0.0&amp;request=GetExecutionResult&amp;executionId=abc&amp;outputId=result.zip" mimeType="application/zip"/>
    </wps:Output>
  </wps:ProcessOutputs>
</wps:ExecuteResponse>"#;

#[test]
fn test_succeeded_with_reference() {
    match parse_execution_status(SUCCEEDED).unwrap() {
        ExecutionStatus::Succeeded { reference: Some(reference) } => {
            assert_eq!(
                reference.href,
                "https://eo.example/geoserver/ows?service=WPS&version=1.0.0&request=GetExecutionResult&executionId=abc&outputId=result.zip"
            );
            assert_eq!(reference.mime_type.as_deref(), Some("application/zip"));
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_accepted() {
    let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0">
      <wps:Status creationTime="2024-03-01T10:15:00.000Z">
        <wps:ProcessAccepted>Process accepted.</wps:ProcessAccepted>
      </wps:Status>
    </wps:ExecuteResponse>"#;
    assert_eq!(
        parse_execution_status(xml).unwrap(),
        ExecutionStatus::InProgress {
            phase: ProcessPhase::Accepted,
            percent_completed: None
        }
    );
}

#[test]
fn test_paused() {
    let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0"><wps:Status><wps:ProcessPaused percentCompleted="10"/></wps:Status></wps:ExecuteResponse>"#;
    assert!(matches!(
        parse_execution_status(xml).unwrap(),
        ExecutionStatus::InProgress { phase: ProcessPhase::Paused, .. }
    ));
}

#[test]
fn test_failed_carries_exception_text() {
    let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1">
      <wps:Status>
        <wps:ProcessFailed>
          <ows:ExceptionReport version="1.1.0">
            <ows:Exception exceptionCode="NoApplicableCode">
              <ows:ExceptionText>Coverage does not intersect the crop shape</ows:ExceptionText>
            </ows:Exception>
          </ows:ExceptionReport>
        </wps:ProcessFailed>
      </wps:Status>
    </wps:ExecuteResponse>"#;
    assert_eq!(
        parse_execution_status(xml).unwrap(),
        ExecutionStatus::Failed {
            message: "Coverage does not intersect the crop shape".to_string()
        }
    );
}

#[test]
fn test_top_level_exception_report() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
    <ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="1.1.0">
      <ows:Exception exceptionCode="InvalidParameterValue" locator="executionId">
        <ows:ExceptionText>Unknown execution id 42</ows:ExceptionText>
      </ows:Exception>
    </ows:ExceptionReport>"#;
    assert_eq!(
        parse_execution_status(xml).unwrap(),
        ExecutionStatus::Exception {
            message: "Unknown execution id 42".to_string()
        }
    );
}

#[test]
fn test_execute_response_without_status() {
    let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0"/>"#;
    assert!(matches!(
        parse_execution_status(xml),
        Err(WpsParseError::MissingStatus)
    ));
}

#[test]
fn test_truncated_document() {
    let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0"><wps:Status><wps:Process"#;
    assert!(parse_execution_status(xml).is_err());
}
