//! Common test fixtures for EODS client tests.
//!
//! Response bodies shaped like those of the catalog search API and the WPS
//! endpoint, plus the connection every test talks to.

use eods_common::Connection;
use serde_json::{json, Value};

pub const DOMAIN: &str = "https://eo.example";
pub const USERNAME: &str = "analyst";
pub const ACCESS_TOKEN: &str = "s3cr3t-token";

pub fn connection() -> Connection {
    Connection::new(DOMAIN, USERNAME, ACCESS_TOKEN)
}

/// Sentinel-2 titles sharing one granule footprint, as the catalog names them.
pub mod titles {
    pub const SPLIT_A: &str = "S2A_date_lat1lon2_T12ABC_ORB034_etc";
    pub const SPLIT_B: &str = "S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc";
    pub const FULL: &str = "S2A_date_lat1lon2_T12ABC_ORB034_fullgran";

    pub fn alternate(title: &str) -> String {
        format!("geonode:{}", title)
    }
}

// ============================================================================
// Catalog search
// ============================================================================

pub fn supplemental_information(cloud_cover: &str) -> String {
    format!(
        "Data Collection Time: time\nARCSI_CLOUD_COVER: {}\netc",
        cloud_cover
    )
}

/// One catalog object. `split_partner` is the title of the other half of a
/// split granule.
pub fn catalog_object(title: &str, cloud_cover: &str, split_partner: Option<&str>) -> Value {
    let mut object = json!({
        "title": title,
        "alternate": titles::alternate(title),
        "supplemental_information": supplemental_information(cloud_cover),
        "csw_wkt_geometry": "POLYGON((-2.46 51.75,-2.46 51.82,-2.34 51.82,-2.34 51.75,-2.46 51.75))",
        "type": "layer",
        "srid": "EPSG:27700",
    });
    if let Some(partner) = split_partner {
        object["split_granule"] = json!({ "name": titles::alternate(partner) });
    }
    object
}

pub fn catalog_response(objects: Vec<Value>) -> String {
    json!({
        "meta": { "total_count": objects.len(), "limit": 20000, "offset": 0 },
        "objects": objects,
    })
    .to_string()
}

pub fn empty_catalog_response() -> String {
    catalog_response(Vec::new())
}

/// A split pair plus the full granule over the same footprint.
pub fn split_pair_and_full(split_a: &str, split_b: &str, full: &str) -> String {
    catalog_response(vec![
        catalog_object(titles::SPLIT_A, split_a, Some(titles::SPLIT_B)),
        catalog_object(titles::SPLIT_B, split_b, Some(titles::SPLIT_A)),
        catalog_object(titles::FULL, full, None),
    ])
}

// ============================================================================
// WPS
// ============================================================================

pub fn execute_accepted(execution_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" service="WPS" version="1.0.0" statusLocation="{}/geoserver/ows?service=WPS&amp;version=1.0.0&amp;request=GetExecutionStatus&amp;executionId={}">
  <wps:Status creationTime="2024-03-01T10:15:00.000Z">
    <wps:ProcessAccepted>Process accepted.</wps:ProcessAccepted>
  </wps:Status>
</wps:ExecuteResponse>"#,
        DOMAIN, execution_id
    )
}

pub fn exception_report(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="1.1.0">
  <ows:Exception exceptionCode="NoApplicableCode">
    <ows:ExceptionText>{}</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#,
        text
    )
}

fn execute_response(status: &str, outputs: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1" service="WPS" version="1.0.0">
  <wps:Status creationTime="2024-03-01T10:16:00.000Z">
    {}
  </wps:Status>{}
</wps:ExecuteResponse>"#,
        status, outputs
    )
}

pub fn status_accepted() -> String {
    execute_response("<wps:ProcessAccepted>Process accepted.</wps:ProcessAccepted>", "")
}

pub fn status_started(percent: u8) -> String {
    execute_response(
        &format!(
            r#"<wps:ProcessStarted percentCompleted="{}">Running</wps:ProcessStarted>"#,
            percent
        ),
        "",
    )
}

pub fn status_succeeded(execution_id: &str, mime_type: &str) -> String {
    let outputs = format!(
        r#"
  <wps:ProcessOutputs>
    <wps:Output>
      <ows:Identifier>result</ows:Identifier>
      <wps:Reference href="{}/geoserver/ows?service=WPS&amp;version=1.0.0&amp;request=GetExecutionResult&amp;executionId={}&amp;outputId=result" mimeType="{}"/>
    </wps:Output>
  </wps:ProcessOutputs>"#,
        DOMAIN, execution_id, mime_type
    );
    execute_response("<wps:ProcessSucceeded>Process succeeded.</wps:ProcessSucceeded>", &outputs)
}

pub fn status_succeeded_without_output() -> String {
    execute_response("<wps:ProcessSucceeded>Process succeeded.</wps:ProcessSucceeded>", "")
}

pub fn status_failed(text: &str) -> String {
    execute_response(
        &format!(
            r#"<wps:ProcessFailed>
      <ows:ExceptionReport version="1.1.0">
        <ows:Exception exceptionCode="NoApplicableCode">
          <ows:ExceptionText>{}</ows:ExceptionText>
        </ows:Exception>
      </ows:ExceptionReport>
    </wps:ProcessFailed>"#,
            text
        ),
        "",
    )
}

/// Result URL the runner should request for `status_succeeded(execution_id, ..)`.
pub fn result_download_url(execution_id: &str) -> String {
    format!(
        "{}/geoserver/ows?service=WPS&version=1.0.0&request=GetExecutionResult&executionId={}&outputId=result&access_token={}",
        DOMAIN, execution_id, ACCESS_TOKEN
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fixture_shape() {
        let body: Value = serde_json::from_str(&split_pair_and_full("0.05", "0.1", "0.12")).unwrap();
        assert_eq!(body["meta"]["total_count"], 3);
        assert_eq!(
            body["objects"][0]["split_granule"]["name"],
            "geonode:S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc"
        );
        assert!(body["objects"][2].get("split_granule").is_none());
    }
}
