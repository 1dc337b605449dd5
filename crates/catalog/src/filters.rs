//! Catalog search filters and their translation to query parameters.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use eods_common::{BoundingBox, Connection};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Large enough to return the whole catalog in one page.
pub const DEFAULT_RESULT_LIMIT: u32 = 20000;

/// Sentinel mission a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SatelliteId {
    Sentinel1 = 1,
    Sentinel2 = 2,
}

impl SatelliteId {
    /// Keyword slug the catalog tags records with (`sentinel-2`).
    pub fn keyword_slug(self) -> String {
        format!("sentinel-{}", u8::from(self))
    }
}

impl TryFrom<u8> for SatelliteId {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(SatelliteId::Sentinel1),
            2 => Ok(SatelliteId::Sentinel2),
            other => Err(format!("satellite_id must be 1 or 2, got {}", other)),
        }
    }
}

impl From<SatelliteId> for u8 {
    fn from(id: SatelliteId) -> Self {
        id as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    #[default]
    Layer,
    Raster,
    Vector,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Layer => "layer",
            RecordType::Raster => "raster",
            RecordType::Vector => "vector",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options recognised by `query_catalog`.
///
/// Pairing rules, checked by [`CatalogFilters::validate`]:
/// - `start_date` and `end_date` are given together or not at all
/// - `cloud_min` and `cloud_max` are given together, and only with
///   `satellite_id = 2`
/// - `find_least_cloud` requires `satellite_id = 2`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub satellite_id: Option<SatelliteId>,
    /// Match or partial match on the layer title.
    pub title: Option<String>,
    pub cloud_min: Option<u8>,
    pub cloud_max: Option<u8>,
    /// WGS84 WKT; records intersecting it are returned.
    pub geometry: Option<String>,
    pub result_limit: Option<u32>,
    /// Sent as `type__in` only when set; the catalog itself defaults to layers.
    pub record_type: Option<RecordType>,
    pub find_least_cloud: bool,
    /// Drop every record whose `alternate` carries the `SPLIT` marker.
    pub ignore_split_granules: bool,
    /// Where `eods-query-all-results.csv` is written.
    pub output_directory: Option<PathBuf>,
}

impl CatalogFilters {
    pub fn is_sentinel2(&self) -> bool {
        self.satellite_id == Some(SatelliteId::Sentinel2)
    }

    pub fn result_limit(&self) -> u32 {
        self.result_limit.unwrap_or(DEFAULT_RESULT_LIMIT)
    }

    /// Check pairing and mutual-exclusion rules. Nothing here touches the
    /// network.
    pub fn validate(&self) -> Result<()> {
        match (self.start_date, self.end_date) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(CatalogError::Validation(
                    "if querying by date, please specify *BOTH* 'start_date' and 'end_date'".into(),
                ));
            }
            (Some(start), Some(end)) if start > end => {
                return Err(CatalogError::Validation(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
            _ => {}
        }

        match (self.cloud_min, self.cloud_max) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(CatalogError::Validation(
                    "if querying by cloud cover, please specify *BOTH* 'cloud_min' and 'cloud_max'"
                        .into(),
                ));
            }
            (Some(min), Some(max)) => {
                if !self.is_sentinel2() {
                    return Err(CatalogError::Validation(
                        "if querying by cloud cover, please specify 'satellite_id'=2".into(),
                    ));
                }
                if min > 100 || max > 100 || min > max {
                    return Err(CatalogError::Validation(format!(
                        "cloud cover range must satisfy 0 <= cloud_min <= cloud_max <= 100, got {}..{}",
                        min, max
                    )));
                }
            }
            (None, None) => {}
        }

        if self.find_least_cloud && !self.is_sentinel2() {
            let given = match self.satellite_id {
                Some(id) => format!("'satellite_id'={}", u8::from(id)),
                None => "no 'satellite_id'".to_string(),
            };
            return Err(CatalogError::Validation(format!(
                "you have specified {} and 'find_least_cloud'=True. Use 'satellite_id'=2 and 'find_least_cloud'=True",
                given
            )));
        }

        if let Some(geometry) = &self.geometry {
            BoundingBox::from_wkt(geometry).map_err(|e| {
                CatalogError::Validation(format!("could not create geometry: {}", e))
            })?;
        }

        if self.result_limit == Some(0) {
            return Err(CatalogError::Validation("result_limit must be positive".into()));
        }

        Ok(())
    }

    /// Query-string pairs for the search endpoint, credentials included.
    pub fn to_query_params(&self, connection: &Connection) -> Vec<(String, String)> {
        let mut params = vec![
            ("username".to_string(), connection.username.clone()),
            ("api_key".to_string(), connection.access_token.clone()),
            ("offset".to_string(), "0".to_string()),
            ("limit".to_string(), self.result_limit().to_string()),
        ];

        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(record_type) = self.record_type {
            push("type__in", record_type.to_string());
        }
        if let Some(satellite_id) = self.satellite_id {
            push("keywords__slug__in", satellite_id.keyword_slug());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            push(
                "date__range",
                format!("{} 00:00,{} 00:00", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            );
        }
        if let Some(title) = &self.title {
            push("q", title.clone());
        }
        if let Some(geometry) = &self.geometry {
            push("geometry", geometry.clone());
        }
        if let (Some(min), Some(max)) = (self.cloud_min, self.cloud_max) {
            if self.is_sentinel2() {
                push("cc_min", min.to_string());
                push("cc_max", max.to_string());
            }
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_params() {
        let conn = Connection::new("https://eo.example", "user", "tok");
        let params = CatalogFilters::default().to_query_params(&conn);

        assert_eq!(value(&params, "username"), Some("user"));
        assert_eq!(value(&params, "api_key"), Some("tok"));
        assert_eq!(value(&params, "offset"), Some("0"));
        assert_eq!(value(&params, "limit"), Some("20000"));
        assert_eq!(value(&params, "type__in"), None);
        assert_eq!(value(&params, "keywords__slug__in"), None);
    }

    #[test]
    fn test_all_params() {
        let conn = Connection::new("https://eo.example", "user", "tok");
        let filters = CatalogFilters {
            start_date: NaiveDate::from_ymd_opt(2019, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2019, 4, 30),
            satellite_id: Some(SatelliteId::Sentinel2),
            title: Some("T30UXB".into()),
            cloud_min: Some(0),
            cloud_max: Some(20),
            geometry: Some("POLYGON((-2.4 51.9, -2.4 51.6, -1.9 51.6, -1.9 51.9, -2.4 51.9))".into()),
            result_limit: Some(50),
            record_type: Some(RecordType::Raster),
            ..Default::default()
        };
        filters.validate().unwrap();
        let params = filters.to_query_params(&conn);

        assert_eq!(value(&params, "limit"), Some("50"));
        assert_eq!(value(&params, "type__in"), Some("raster"));
        assert_eq!(value(&params, "keywords__slug__in"), Some("sentinel-2"));
        assert_eq!(
            value(&params, "date__range"),
            Some("2019-04-01 00:00,2019-04-30 00:00")
        );
        assert_eq!(value(&params, "q"), Some("T30UXB"));
        assert_eq!(value(&params, "cc_min"), Some("0"));
        assert_eq!(value(&params, "cc_max"), Some("20"));
        assert!(value(&params, "geometry").unwrap().starts_with("POLYGON"));
    }

    #[test]
    fn test_satellite_id_from_number() {
        let filters: CatalogFilters = serde_json::from_str(r#"{"satellite_id": 2}"#).unwrap();
        assert!(filters.is_sentinel2());
        assert!(serde_json::from_str::<CatalogFilters>(r#"{"satellite_id": 3}"#).is_err());
    }

    #[test]
    fn test_cloud_range_bounds() {
        let filters = CatalogFilters {
            satellite_id: Some(SatelliteId::Sentinel2),
            cloud_min: Some(50),
            cloud_max: Some(10),
            ..Default::default()
        };
        assert!(matches!(filters.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_reversed_dates() {
        let filters = CatalogFilters {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 2),
            end_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_bad_geometry() {
        let filters = CatalogFilters {
            geometry: Some("not wkt".into()),
            ..Default::default()
        };
        assert!(matches!(filters.validate(), Err(CatalogError::Validation(_))));
    }
}
