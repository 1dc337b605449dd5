//! CSV export of a query's result table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::record::CatalogRecord;

pub const QUERY_RESULTS_FILE: &str = "eods-query-all-results.csv";

#[derive(Serialize)]
struct ResultRow<'a> {
    title: &'a str,
    alternate: &'a str,
    #[serde(rename = "type")]
    record_type: Option<&'a str>,
    date: Option<&'a str>,
    srid: Option<&'a str>,
    #[serde(rename = "granule-ref")]
    granule_ref: Option<&'a str>,
    #[serde(rename = "orbit-ref")]
    orbit_ref: Option<&'a str>,
    #[serde(rename = "ARCSI_CLOUD_COVER")]
    cloud_cover: Option<f64>,
    #[serde(rename = "split_granule.name")]
    split_granule_name: Option<&'a str>,
    #[serde(rename = "split_ARCSI_CLOUD_COVER")]
    split_cloud_cover_partner: Option<f64>,
    split_cloud_cover: Option<f64>,
    title_stub: Option<&'a str>,
    #[serde(rename = "gran-orb")]
    gran_orb: Option<&'a str>,
    #[serde(rename = "granule-stub")]
    granule_stub: Option<&'a str>,
    csw_wkt_geometry: Option<&'a str>,
}

impl<'a> From<&'a CatalogRecord> for ResultRow<'a> {
    fn from(r: &'a CatalogRecord) -> Self {
        let keys = r.dedup_keys.as_ref();
        Self {
            title: &r.title,
            alternate: &r.alternate,
            record_type: r.record_type.as_deref(),
            date: r.date.as_deref(),
            srid: r.srid.as_deref(),
            granule_ref: r.granule_ref.as_deref(),
            orbit_ref: r.orbit_ref.as_deref(),
            cloud_cover: r.cloud_cover,
            split_granule_name: r.split_granule_name.as_deref(),
            split_cloud_cover_partner: r.split_cloud_cover_partner,
            split_cloud_cover: r.split_cloud_cover,
            title_stub: keys.map(|k| k.title_stub.as_str()),
            gran_orb: keys.map(|k| k.gran_orb.as_str()),
            granule_stub: keys.map(|k| k.granule_stub.as_str()),
            csw_wkt_geometry: r.geometry_wkt.as_deref(),
        }
    }
}

/// Write `records` to `<dir>/eods-query-all-results.csv`, creating `dir`
/// if needed. Returns the file path.
pub fn write_query_results(dir: &Path, records: &[CatalogRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(QUERY_RESULTS_FILE);

    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(ResultRow::from(record))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Wrote query results");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = CatalogRecord::new("S2A_t", "geonode:S2A_t");
        record.cloud_cover = Some(0.25);

        let path = write_query_results(&dir.path().join("nested"), &[record]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("title,alternate,type,"));
        assert!(header.contains("gran-orb"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("S2A_t,geonode:S2A_t,"));
        assert!(row.contains("0.25"));
        assert!(lines.next().is_none());
    }
}
